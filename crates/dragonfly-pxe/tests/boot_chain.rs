use dragonfly_pxe::{
    parent_directory, parse_url, read_exact_at, read_to_end, url_error, Cause, LazyFile,
    MemoryScheme, MemorySchemeError, Schemes, UrlError,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use url::Url;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A TFTP server holding the top-level pxelinux config and the kernel, and an
/// HTTP server holding the per-machine config
fn boot_network() -> (Arc<MemoryScheme>, Arc<MemoryScheme>, Schemes) {
    let mut tftp = MemoryScheme::new("tftp");
    tftp.add(
        "192.168.1.1",
        "/foobar/pxelinux.cfg/default",
        "include http://192.168.2.1/configs/your-machine.cfg\n",
    );
    tftp.add("192.168.1.1", "/images/vmlinuz", vec![0x4du8, 0x5a, 0x90, 0x00]);

    let mut http = MemoryScheme::new("http");
    http.add(
        "192.168.2.1",
        "/configs/your-machine.cfg",
        "include ./menus/../menus/main.cfg\n",
    );
    http.add(
        "192.168.2.1",
        "/configs/menus/main.cfg",
        "kernel tftp://192.168.1.1/images/vmlinuz\ninitrd tftp://192.168.1.1/images/initrd.img\n",
    );

    let tftp = Arc::new(tftp);
    let http = Arc::new(http);

    let schemes = Schemes::new();
    schemes.register_arc("tftp", tftp.clone());
    schemes.register_arc("http", http.clone());

    (tftp, http, schemes)
}

/// Follows `include` lines until a config without one, returning the boot
/// artifacts it names as lazily opened files
async fn walk(
    schemes: &Schemes,
    reference: &str,
    wd: &Url,
) -> Result<Vec<(String, LazyFile)>, UrlError> {
    let mut url = parse_url(reference, wd).unwrap();

    loop {
        let content = String::from_utf8(schemes.read_file(&url).await?).unwrap();
        let wd = parent_directory(&url);

        let mut next = None;
        let mut artifacts = Vec::new();
        for line in content.lines() {
            let Some((keyword, target)) = line.split_once(' ') else {
                continue;
            };
            let target = parse_url(target, &wd).unwrap();
            match keyword {
                "include" => next = Some(target),
                _ => artifacts.push((keyword.to_string(), schemes.lazy_get_file(&target)?)),
            }
        }

        match next {
            Some(target) => url = target,
            None => return Ok(artifacts),
        }
    }
}

#[tokio::test]
async fn test_walk_config_chain_across_schemes() {
    init_tracing();
    let (tftp, http, schemes) = boot_network();
    let wd = Url::parse("tftp://192.168.1.1/foobar/pxelinux.cfg").unwrap();

    let artifacts = walk(&schemes, "default", &wd).await.unwrap();
    assert_eq!(artifacts.len(), 2);
    assert_eq!(http.total_calls(), 2);

    // Only configs were fetched so far
    let kernel_url = Url::parse("tftp://192.168.1.1/images/vmlinuz").unwrap();
    let initrd_url = Url::parse("tftp://192.168.1.1/images/initrd.img").unwrap();
    assert_eq!(tftp.total_calls(), 1);

    let (name, kernel) = &artifacts[0];
    assert_eq!(name, "kernel");
    assert_eq!(kernel.url(), &kernel_url);

    let mut magic = [0u8; 2];
    read_exact_at(kernel, &mut magic, 0).await.unwrap();
    assert_eq!(&magic, b"MZ");
    assert_eq!(read_to_end(kernel).await.unwrap(), vec![0x4du8, 0x5a, 0x90, 0x00]);
    assert_eq!(tftp.num_called(&kernel_url), 1);

    // The initrd doesn't exist, which only shows once somebody reads it
    let (name, initrd) = &artifacts[1];
    assert_eq!(name, "initrd");
    assert_eq!(tftp.num_called(&initrd_url), 0);

    let err = read_to_end(initrd).await.unwrap_err();
    let err = url_error(&err).unwrap();
    assert_eq!(err.url, initrd_url);
    assert_eq!(
        err.downcast_ref::<MemorySchemeError>(),
        Some(&MemorySchemeError::NoSuchFile("/images/initrd.img".to_string()))
    );

    read_to_end(initrd).await.unwrap_err();
    assert_eq!(tftp.num_called(&initrd_url), 1);
}

#[tokio::test]
async fn test_walk_stops_at_unknown_scheme() {
    init_tracing();
    let (_, _, schemes) = boot_network();
    schemes.unregister("http");
    let wd = Url::parse("tftp://192.168.1.1/foobar/pxelinux.cfg").unwrap();

    let err = walk(&schemes, "default", &wd).await.unwrap_err();
    assert!(err.is_no_such_scheme());
    assert!(matches!(err.cause, Cause::NoSuchScheme));
    assert_eq!(
        err.url,
        Url::parse("http://192.168.2.1/configs/your-machine.cfg").unwrap()
    );
}

#[tokio::test]
async fn test_walk_reports_missing_config() {
    init_tracing();
    let (_, _, schemes) = boot_network();
    let wd = Url::parse("tftp://192.168.1.1/foobar/pxelinux.cfg").unwrap();

    let err = walk(&schemes, "01-52-54-00-12-34-56", &wd).await.unwrap_err();
    assert_eq!(
        err.url,
        Url::parse("tftp://192.168.1.1/foobar/pxelinux.cfg/01-52-54-00-12-34-56").unwrap()
    );
    assert!(matches!(
        err.downcast_ref::<MemorySchemeError>(),
        Some(MemorySchemeError::NoSuchFile(_))
    ));
}

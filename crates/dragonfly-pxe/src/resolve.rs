//! Reference resolution
//!
//! Boot configs refer to the next file either by absolute URL
//! (`http://192.168.2.1/configs/your-machine.cfg`) or by a path relative to
//! the directory the config was loaded from (`pxelinux.cfg/default`,
//! `../kernels/vmlinuz`). [`parse_url`] turns either form into an absolute
//! URL that [`Schemes`](crate::Schemes) can dispatch on.

use crate::error::ResolveError;
use url::Url;

/// Resolve `reference` against the working directory URL `wd`
///
/// An absolute URL is returned unchanged and `wd` is ignored. Anything else
/// is a reference relative to `wd`, which names a directory: the result keeps
/// `wd`'s scheme and host and joins the reference onto `wd`'s path.
///
/// - `//host/path` keeps only `wd`'s scheme
/// - `path` and `/path` are both joined onto `wd`'s path
/// - an empty path keeps `wd`'s path
///
/// The reference path is cleaned on its own before the join and the result
/// is cleaned again (see [`clean_path`]), so a leading `/` or `/..` can't
/// climb out of `wd`. Query and fragment come from `reference` only.
///
/// # Example
///
/// ```
/// use dragonfly_pxe::parse_url;
/// use url::Url;
///
/// let wd = Url::parse("tftp://192.168.1.1/foobar/pxelinux.cfg").unwrap();
///
/// let url = parse_url("default", &wd).unwrap();
/// assert_eq!(url.as_str(), "tftp://192.168.1.1/foobar/pxelinux.cfg/default");
///
/// let url = parse_url("http://192.168.2.1/configs/your-machine.cfg", &wd).unwrap();
/// assert_eq!(url.as_str(), "http://192.168.2.1/configs/your-machine.cfg");
/// ```
pub fn parse_url(reference: &str, wd: &Url) -> Result<Url, ResolveError> {
    let parse_error = |source: url::ParseError| ResolveError::Parse {
        reference: reference.to_string(),
        source,
    };

    match Url::parse(reference) {
        Ok(url) => return Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {}
        Err(source) => return Err(parse_error(source)),
    }

    if wd.cannot_be_a_base() {
        return Err(ResolveError::CannotBeABase {
            reference: reference.to_string(),
            base: wd.clone(),
        });
    }

    if reference.starts_with("//") {
        return wd.join(reference).map_err(parse_error);
    }

    let (rest, fragment) = match reference.split_once('#') {
        Some((rest, fragment)) => (rest, Some(fragment)),
        None => (reference, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };

    let mut resolved = wd.clone();
    if !path.is_empty() {
        resolved.set_path(&clean_path(&format!("{}/{}", wd.path(), clean_path(path))));
    }
    resolved.set_query(query);
    resolved.set_fragment(fragment);

    Ok(resolved)
}

/// Directory containing the file at `url`, for use as a working directory
///
/// Query and fragment are dropped.
///
/// ```
/// use dragonfly_pxe::parent_directory;
/// use url::Url;
///
/// let config = Url::parse("tftp://192.168.1.1/boot/pxelinux.cfg/default").unwrap();
/// assert_eq!(
///     parent_directory(&config).as_str(),
///     "tftp://192.168.1.1/boot/pxelinux.cfg"
/// );
/// ```
pub fn parent_directory(url: &Url) -> Url {
    let mut dir = url.clone();
    if !dir.cannot_be_a_base() {
        let path = url.path();
        if let Some(idx) = path.rfind('/') {
            dir.set_path(&clean_path(&path[..=idx]));
        }
    }
    dir.set_query(None);
    dir.set_fragment(None);
    dir
}

/// Lexically clean a slash-separated path
///
/// Repeated slashes collapse, `.` elements are dropped, and each `..`
/// removes the element before it. A rooted path never climbs above `/`; an
/// unrooted one keeps leading `..` elements. Trailing slashes are removed,
/// and an empty result becomes `/` or `.`.
///
/// ```
/// use dragonfly_pxe::clean_path;
///
/// assert_eq!(clean_path("/boot//pxelinux.cfg/./../vmlinuz"), "/boot/vmlinuz");
/// assert_eq!(clean_path("/../boot/"), "/boot");
/// assert_eq!(clean_path("a/../../b"), "../b");
/// ```
pub fn clean_path(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

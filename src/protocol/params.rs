//! Request parameter access
//!
//! Query strings and urlencoded forms are extracted as ordered key/value
//! pairs so repeated keys such as `glob[]` survive.

/// Decoded key/value pairs in request order.
pub type Params = Vec<(String, String)>;

/// First value for `key`; later duplicates are ignored.
pub fn first<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Every value for `key`, in order.
pub fn all<'a>(params: &'a [(String, String)], key: &'a str) -> impl Iterator<Item = &'a str> {
    params
        .iter()
        .filter(move |(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

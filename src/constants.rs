// -
// Database namespaces

/// Sled database tree namespaces
pub(crate) const KV_TREE: &str = "_kv_tree";
pub(crate) const META_TREE: &str = "_kv_metadata";

/// Sled entry key namespaces
pub(crate) const META_KEY_LAST_REVISION: &str = "_last_applied_revision";

/// Sub-directory of a node's data dir holding its database
pub(crate) const MEMBER_DIR: &str = "member";

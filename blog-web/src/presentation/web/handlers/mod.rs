pub(crate) mod accounts;
pub(crate) mod comments;
pub(crate) mod posts;

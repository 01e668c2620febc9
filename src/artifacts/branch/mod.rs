//! Reference names
//!
//! - `ref_name`: validated ref names and the rules used to expand a short name
//!   (`master`, `origin/master`) into the full ref paths git would try

pub mod ref_name;

/// Local branch tip reconciled when none is given
pub const DEFAULT_LOCAL_REF: &str = "refs/heads/master";
/// Remote-tracking counterpart reconciled when none is given
pub const DEFAULT_REMOTE_REF: &str = "origin/master";

pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
};
/// Full ref paths tried, in order, when resolving a short ref name
pub const REF_RESOLUTION_RULES: [&str; 6] = [
    "%s",
    "refs/%s",
    "refs/tags/%s",
    "refs/heads/%s",
    "refs/remotes/%s",
    "refs/remotes/%s/HEAD",
];

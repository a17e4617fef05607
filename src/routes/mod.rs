/// Router Module Index
///
/// Routes are grouped by the credential they require. Catalog mutations share
/// paths with public reads, so the owner check lives in the `Owner` extractor
/// of each mutating handler rather than in a router layer.

/// Sign-up, sign-in and sign-out. No credential required.
pub mod public;

/// Categories and menus. Reads are public; writes take an `Owner`.
pub mod catalog;

/// Routes wrapped in the authentication middleware.
pub mod authenticated;

//! Pico-chan identity helpers
//!
//! Pseudonyms are a truncated SHA-1 of `address|salt|day`, shown next to each
//! message with a color derived from the same six hex digits.
//!
//! This is NOT an anonymity or identity guarantee:
//! - the salt is a shared server secret, not a MAC key
//! - 24 bits of digest collide easily and can be brute-forced over the
//!   IPv4 space by anyone holding the salt
//! - daily rotation only unlinks posts across day boundaries
//!
//! Treat the pseudonym as a UI affordance.

pub mod color;
pub mod pseudonym;

pub use color::color_from_pseudonym;
pub use pseudonym::IdentityHasher;

//! Auth-domain identifiers, identities, token secrets, claims decoding, and random values.

pub mod claims;
pub mod id;
pub mod identity;
pub mod random;
pub mod scope;
pub mod token;

pub use claims::*;
pub use id::*;
pub use identity::*;
pub use random::*;
pub use scope::*;
pub use token::*;

//! Identifiers of collections and tree nodes.
//!
//! Uids are generated by the collection loader from the URL-safe alphabet `[A-Za-z0-9_-]`.
//! They end up inside token store keys and span fields, so anything outside that alphabet is
//! rejected up front.

// std
use std::borrow::Borrow;
// self
use crate::_prelude::*;

macro_rules! def_uid {
	($name:ident, $kind:literal, $doc:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and wraps it.
			pub fn new(value: impl Into<String>) -> Result<Self, UidError> {
				let value = value.into();

				check_uid($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl TryFrom<String> for $name {
			type Error = UidError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, "{}#{}", $kind, self.0)
			}
		}
	};
}

def_uid! { CollectionUid, "collection", "Uid of a loaded collection; the outermost part of every token store key." }
def_uid! { ItemUid, "item", "Uid of a folder or request." }

/// Rejected uid.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum UidError {
	/// Nothing to identify with.
	#[error("The {kind} uid is empty.")]
	Empty {
		/// `collection` or `item`.
		kind: &'static str,
	},
	/// A character outside `[A-Za-z0-9_-]`.
	#[error("The {kind} uid contains {found:?} at byte {at}.")]
	InvalidCharacter {
		/// `collection` or `item`.
		kind: &'static str,
		/// Offending character.
		found: char,
		/// Byte offset of `found`.
		at: usize,
	},
}

fn check_uid(kind: &'static str, value: &str) -> Result<(), UidError> {
	if value.is_empty() {
		return Err(UidError::Empty { kind });
	}

	match value.char_indices().find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_')))
	{
		Some((at, found)) => Err(UidError::InvalidCharacter { kind, found, at }),
		None => Ok(()),
	}
}

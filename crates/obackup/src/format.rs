//! Common types defining the binary format structures.
//!
//! An archive is a sequence of zstd frames:
//!
//! - a skippable frame with the [file header](FileHeader), byte-identical to [`FILE_MAGIC`];
//! - for each member, a skippable frame with the [entry header](EntryHeader), directly followed by
//!   one zstd frame of exactly [`EntryHeader::compressed`] bytes holding the member content.
//!
//! The archive ends at the end of the file, on a member boundary. Because every member carries its
//! own header, the archive can be read forward in a single pass, without seeking.

#[doc(inline)]
pub use self::entry::*;
#[doc(inline)]
pub use self::framing::*;
#[doc(inline)]
pub use self::header::*;

mod entry;
mod framing;
mod header;

//! Archive container: named members, written once and read forward.
//!
//! [`ArchiveWriter`] appends members to a file, and [`ArchiveReader`] walks them in order with
//! [`next_entry()`](ArchiveReader::next_entry). There is no index and no rewinding: once the
//! reader has moved past a member, that member's content is gone for this reader. To look again,
//! open another reader.
//!
//! Both handles release their file when dropped, so every exit path closes the archive.
//! [`ArchiveWriter::finish()`] additionally flushes and reports flush errors.

#[doc(inline)]
pub use self::reader::ArchiveReader;
#[doc(inline)]
pub use self::writer::ArchiveWriter;
#[doc(inline)]
pub use crate::format::Entry;

mod reader;
mod writer;

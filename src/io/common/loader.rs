/// Read access to one index of the cache, addressed by group and file.
/// This is the boundary towards the container format, which already took care of decompression.
pub trait ArchiveReader {
    /// in case of a shared in-memory store, this has to copy the record out of it.
    fn read_record(&self, group_id: u32, file_id: u32) -> Option<Vec<u8>>;
}

impl<A: ArchiveReader + ?Sized> ArchiveReader for std::sync::Arc<A> {
    fn read_record(&self, group_id: u32, file_id: u32) -> Option<Vec<u8>> {
        self.as_ref().read_record(group_id, file_id)
    }
}

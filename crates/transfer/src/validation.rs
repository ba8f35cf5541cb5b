use crate::TransferError;

/// Rejects files larger than `max` bytes.
///
/// Runs before any connection attempt so an oversize file costs no round trip.
pub fn validate_file_size(size: u64, max: u64) -> Result<(), TransferError> {
    if size > max {
        return Err(TransferError::FileTooLarge { size, max });
    }
    Ok(())
}

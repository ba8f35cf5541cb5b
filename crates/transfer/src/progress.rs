use dropshare_protocol::constants::PROGRESS_CAP;

/// Progress percentage while chunks are being sent.
///
/// `round(95 * chunks_sent / total_chunks)`, never above [`PROGRESS_CAP`].
/// With no chunks to send the upload is trivially complete on the client
/// side, so the cap is returned.
pub fn capped_progress(chunks_sent: u64, total_chunks: u64) -> u8 {
    if total_chunks == 0 {
        return PROGRESS_CAP;
    }
    let sent = chunks_sent.min(total_chunks) as f64;
    let pct = (f64::from(PROGRESS_CAP) * sent / total_chunks as f64).round();
    pct.min(f64::from(PROGRESS_CAP)) as u8
}

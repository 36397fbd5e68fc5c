pub mod box_blur;
pub mod lab;
pub mod sharpen;

/// Number of interleaved channels in the working RGBA buffers.
pub(crate) const CHANNELS: usize = 4;

/// Runs `f(y, row)` over every row of an interleaved RGBA buffer.
///
/// With the `rayon` feature the rows are processed in parallel; rows never
/// alias, so the result is identical either way.
pub(crate) fn for_each_row_mut<F>(buffer: &mut [u8], width: u32, f: F)
where
    F: Fn(usize, &mut [u8]) + Send + Sync,
{
    let row_len = width as usize * CHANNELS;
    if row_len == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        buffer
            .par_chunks_mut(row_len)
            .enumerate()
            .for_each(|(y, row)| f(y, row));
    }

    #[cfg(not(feature = "rayon"))]
    buffer
        .chunks_mut(row_len)
        .enumerate()
        .for_each(|(y, row)| f(y, row));
}

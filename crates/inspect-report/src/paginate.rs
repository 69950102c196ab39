//! Splitting a tall raster into page-sized slices

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Rows `offset .. offset + height` of the source raster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSlice {
    /// Zero-based page number
    pub index: usize,
    /// First source row
    pub offset: u32,
    /// Source rows on this page; the last page may be shorter and is padded
    pub height: u32,
}

/// Cut `content_height` rows into `ceil(content_height / page_height)` slices
///
/// Slice `i` starts at `i * page_height`. Slices never overlap and leave no
/// gap.
pub fn paginate(content_height: u32, page_height: u32) -> Result<Vec<PageSlice>> {
    if page_height == 0 {
        return Err(Error::RenderFailure("page height is zero".to_string()));
    }
    if content_height == 0 {
        return Err(Error::RenderFailure("rendered content is empty".to_string()));
    }
    let pages = content_height.div_ceil(page_height);
    Ok((0..pages)
        .map(|i| {
            let offset = i * page_height;
            PageSlice {
                index: i as usize,
                offset,
                height: page_height.min(content_height - offset),
            }
        })
        .collect())
}

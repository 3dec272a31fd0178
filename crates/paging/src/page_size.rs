//! Page-size normalization.

/// Page size used when the caller asks for zero or fewer records.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Upper bound on records returned by one call.
pub const MAX_PAGE_SIZE: usize = 100;

/// Why a requested page size was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSizeAdjustment {
    /// A zero or negative size was replaced by the default.
    NonPositiveToDefault { requested: i32 },
    /// A size above the maximum was lowered to the maximum.
    ExcessiveToMaximum { requested: i32 },
}

impl PageSizeAdjustment {
    fn reason(&self) -> &'static str {
        match self {
            PageSizeAdjustment::NonPositiveToDefault { .. } => "non_positive",
            PageSizeAdjustment::ExcessiveToMaximum { .. } => "excessive",
        }
    }
}

/// Result of clamping: the size to use and the adjustment, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClampedPageSize {
    pub effective: usize,
    pub adjustment: Option<PageSizeAdjustment>,
}

/// Default and maximum page sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSizeLimits {
    default_size: usize,
    max_size: usize,
}

impl PageSizeLimits {
    /// Creates limits, keeping `max_size` at least 1 and the default no
    /// larger than the maximum.
    pub fn new(default_size: usize, max_size: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            default_size: default_size.clamp(1, max_size),
            max_size,
        }
    }

    pub fn default_size(&self) -> usize {
        self.default_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Normalizes a requested page size.
    ///
    /// | requested | effective |
    /// |---|---|
    /// | `<= 0` | default |
    /// | `> max` | max |
    /// | otherwise | requested |
    ///
    /// Adjustments are logged at warn level; the returned value reports them
    /// as well.
    pub fn clamp(&self, requested: i32) -> ClampedPageSize {
        let clamped = match usize::try_from(requested) {
            Ok(0) | Err(_) => ClampedPageSize {
                effective: self.default_size,
                adjustment: Some(PageSizeAdjustment::NonPositiveToDefault { requested }),
            },
            Ok(n) if n > self.max_size => ClampedPageSize {
                effective: self.max_size,
                adjustment: Some(PageSizeAdjustment::ExcessiveToMaximum { requested }),
            },
            Ok(n) => ClampedPageSize {
                effective: n,
                adjustment: None,
            },
        };

        match clamped.adjustment {
            Some(PageSizeAdjustment::NonPositiveToDefault { .. }) => {
                tracing::warn!(
                    requested,
                    effective = clamped.effective,
                    "non-positive page size adjusted to default"
                );
            }
            Some(PageSizeAdjustment::ExcessiveToMaximum { .. }) => {
                tracing::warn!(
                    requested,
                    effective = clamped.effective,
                    "excessive page size adjusted to maximum"
                );
            }
            None => {}
        }
        if let Some(adjustment) = clamped.adjustment {
            metrics::counter!("paging_page_size_adjusted_total", "reason" => adjustment.reason())
                .increment(1);
        }

        clamped
    }
}

impl Default for PageSizeLimits {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }
}

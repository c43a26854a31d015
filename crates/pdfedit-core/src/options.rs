//! Options for extraction and reconstruction.

/// Options controlling extraction behavior and resource limits.
///
/// Resource limits let a host bound the work done for one call.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum input size in bytes (default: None = no limit).
    pub max_input_bytes: Option<usize>,
    /// Maximum number of pages to process (default: None = no limit).
    pub max_pages: Option<usize>,
    /// Maximum number of raw primitives read per page and class
    /// (default: 100,000). Extra primitives are ignored.
    pub max_elements_per_page: usize,
    /// Maximum recursion depth for nested form XObjects (default: 10).
    pub max_recursion_depth: usize,
    /// Whether to read raster images (default: true).
    pub extract_images: bool,
    /// Whether adjacent engine spans with identical style are merged
    /// (default: true).
    pub merge_spans: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_input_bytes: None,
            max_pages: None,
            max_elements_per_page: 100_000,
            max_recursion_depth: 10,
            extract_images: true,
            merge_spans: true,
        }
    }
}

/// A line dash pattern, as written by the `d` operator.
#[derive(Debug, Clone, PartialEq)]
pub struct DashPattern {
    pub array: Vec<f64>,
    pub phase: f64,
}

impl Default for DashPattern {
    fn default() -> Self {
        Self {
            array: vec![3.0, 3.0],
            phase: 0.0,
        }
    }
}

/// Options controlling reconstruction output.
#[derive(Debug, Clone)]
pub struct ReconstructOptions {
    /// Compress content streams (default: true).
    pub compress: bool,
    /// Dash pattern used for lines marked `dashed` (default: `[3 3] 0`).
    pub dash_pattern: DashPattern,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self {
            compress: true,
            dash_pattern: DashPattern::default(),
        }
    }
}

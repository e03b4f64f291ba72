//! MIME type detection module
//!
//! Maps file extensions to Content-Type values for the assets the modeler
//! front end ships (bundled JS, stylesheets, fonts, BPMN documents).

/// Get MIME Content-Type based on file extension
///
/// # Examples
/// ```
/// use bpmn_server::http::mime::content_type_for;
/// assert_eq!(content_type_for(Some("bpmn")), "application/xml; charset=utf-8");
/// assert_eq!(content_type_for(None), "application/octet-stream");
/// ```
pub fn content_type_for(extension: Option<&str>) -> &'static str {
    match extension {
        // Markup and styles
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css",
        Some("txt" | "md") => "text/plain; charset=utf-8",

        // Diagram documents are XML interchange files
        Some("bpmn" | "xml") => "application/xml; charset=utf-8",

        // Scripts and data
        Some("js" | "mjs") => "application/javascript",
        Some("json" | "map") => "application/json",
        Some("wasm") => "application/wasm",

        // Images
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",

        // Fonts (the BPMN icon font ships in all four)
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("eot") => "application/vnd.ms-fontobject",

        // Default
        _ => "application/octet-stream",
    }
}

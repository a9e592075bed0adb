use crate::StoreError;
use oxigraph::io::RdfFormat;
use std::ffi::OsStr;
use std::path::Path;

/// Guesses the RDF format of a file from its extension.
pub fn rdf_format_from_path(path: &Path) -> Result<RdfFormat, StoreError> {
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .ok_or_else(|| StoreError::UnknownFormat(path.display().to_string()))?;
    RdfFormat::from_extension(ext).ok_or_else(|| StoreError::UnknownFormat(ext.to_owned()))
}

/// Resolves an RDF format from an extension, a media type or a common format name.
pub fn rdf_format_from_name(name: &str) -> Result<RdfFormat, StoreError> {
    if let Some(format) = RdfFormat::from_extension(name) {
        return Ok(format);
    }
    if let Some(format) = RdfFormat::from_media_type(name) {
        return Ok(format);
    }
    match name.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
        "turtle" => Ok(RdfFormat::Turtle),
        "ntriples" => Ok(RdfFormat::NTriples),
        "nquads" => Ok(RdfFormat::NQuads),
        "trig" => Ok(RdfFormat::TriG),
        "n3" => Ok(RdfFormat::N3),
        "rdfxml" | "xml" => Ok(RdfFormat::RdfXml),
        _ => Err(StoreError::UnknownFormat(name.to_owned())),
    }
}

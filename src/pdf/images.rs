//! Embedded image enumeration
//!
//! Lists the Image XObjects reachable from each page's resources and
//! recovers where each one is drawn by interpreting the page content
//! stream. Only the graphics state operators that move the CTM (`q`, `Q`,
//! `cm`) and XObject invocation (`Do`) are interpreted.
//!
//! Positions use a top-left origin: `y_position` is the distance from
//! the top edge of the page box down to the top edge of the image.
//!
//! Every resource entry naming an image is its own occurrence, even when
//! several entries point at the same stream. Files whose cross-reference
//! data lopdf cannot read are repaired through MuPDF first.

use std::collections::HashMap;
use std::path::Path;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::document::{ColorSpace, DocumentError, DocumentResult, ImageEncoding, PageImage};

/// Nesting limit for Form XObjects and the page tree
const MAX_DEPTH: usize = 16;

/// Fallback page top when neither CropBox nor MediaBox resolves (US Letter)
const DEFAULT_PAGE_TOP: f32 = 792.0;

/// Resource names leading from the page's XObject dictionary to an image
type ResourcePath = Vec<Vec<u8>>;

/// Enumerate every embedded image on every page
///
/// A file that neither lopdf nor MuPDF's repair can load yields no images;
/// the text layer pass decides whether the document opens at all.
pub fn extract_page_images(path: &Path) -> DocumentResult<Vec<PageImage>> {
    let doc = match load_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("Skipping image pass, document unreadable: {}", e);
            return Ok(Vec::new());
        }
    };
    let images = document_images(&doc);

    tracing::debug!(images = images.len(), "Embedded images enumerated");
    Ok(images)
}

fn load_document(path: &Path) -> DocumentResult<Document> {
    let mut doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("lopdf failed to load document ({}), repairing with MuPDF", e);
            Document::load_mem(&repaired_copy(path)?)?
        }
    };

    if doc.is_encrypted() {
        doc.decrypt("")
            .map_err(|e| DocumentError::Parse(format!("Encrypted PDF: {}", e)))?;
        tracing::debug!("Decrypted PDF with empty password");
    }

    Ok(doc)
}

/// Re-serialize the document through MuPDF, which rebuilds broken xref data
fn repaired_copy(path: &Path) -> DocumentResult<Vec<u8>> {
    let path_str = path.to_str().ok_or_else(|| {
        DocumentError::Parse(format!("Path is not valid UTF-8: {}", path.display()))
    })?;

    let doc = mupdf::pdf::PdfDocument::open(path_str)?;
    let mut buffer = Vec::new();
    doc.write_to(&mut buffer)?;
    Ok(buffer)
}

pub(crate) fn document_images(doc: &Document) -> Vec<PageImage> {
    doc.get_pages()
        .into_values()
        .enumerate()
        .flat_map(|(page_index, page_id)| page_images(doc, page_index, page_id))
        .collect()
}

fn page_images(doc: &Document, page_index: usize, page_id: ObjectId) -> Vec<PageImage> {
    let Some(resources) = inherited(doc, page_id, b"Resources").and_then(|o| o.as_dict().ok())
    else {
        return Vec::new();
    };

    let mut occurrences = Vec::new();
    collect_images(doc, resources, &mut Vec::new(), &mut Vec::new(), &mut occurrences);
    if occurrences.is_empty() {
        return Vec::new();
    }

    let placements = resolve_placements(doc, page_index, page_id, resources);
    let page_top = page_top(doc, page_id);

    occurrences
        .into_iter()
        .filter_map(|(key, id)| {
            let stream = doc.get_object(id).and_then(Object::as_stream).ok()?;
            let y_position = placements
                .get(&key)
                .map(|top| page_top - top)
                .unwrap_or(0.0);

            tracing::trace!(page = page_index, ?id, y_position, "Found image");
            Some(read_image(doc, stream, page_index, y_position))
        })
        .collect()
}

/// Image XObject entries of a resource dictionary, including those inside forms
///
/// `forms` holds the forms on the current path, so a form that includes
/// itself is not entered again.
fn collect_images(
    doc: &Document,
    resources: &Dictionary,
    path: &mut ResourcePath,
    forms: &mut Vec<ObjectId>,
    occurrences: &mut Vec<(ResourcePath, ObjectId)>,
) {
    let Some(xobjects) = resolved_dict(doc, resources, b"XObject") else {
        return;
    };

    for (name, value) in xobjects.iter() {
        let Ok(id) = value.as_reference() else {
            continue;
        };
        let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
            continue;
        };

        match subtype(stream) {
            Some(b"Image") => occurrences.push((resource_key(path, name), id)),
            Some(b"Form") if forms.len() < MAX_DEPTH && !forms.contains(&id) => {
                if let Some(form_resources) = resolved_dict(doc, &stream.dict, b"Resources") {
                    path.push(name.clone());
                    forms.push(id);
                    collect_images(doc, form_resources, path, forms, occurrences);
                    forms.pop();
                    path.pop();
                }
            }
            _ => {}
        }
    }
}

fn resource_key(path: &[Vec<u8>], name: &[u8]) -> ResourcePath {
    let mut key = path.to_vec();
    key.push(name.to_vec());
    key
}

/// Top edge (in default user space) of the first placement of each image entry
fn resolve_placements(
    doc: &Document,
    page_index: usize,
    page_id: ObjectId,
    resources: &Dictionary,
) -> HashMap<ResourcePath, f32> {
    let mut walker = PlacementWalker {
        doc,
        placements: HashMap::new(),
    };

    match doc.get_page_content(page_id) {
        Ok(content) => walker.walk(&content, resources, &mut Vec::new(), Matrix::IDENTITY, 0),
        Err(e) => {
            tracing::warn!(page = page_index, "Failed to read page content: {}", e);
        }
    }

    walker.placements
}

struct PlacementWalker<'a> {
    doc: &'a Document,
    placements: HashMap<ResourcePath, f32>,
}

impl<'a> PlacementWalker<'a> {
    fn walk(
        &mut self,
        content: &[u8],
        resources: &'a Dictionary,
        path: &mut ResourcePath,
        base: Matrix,
        depth: usize,
    ) {
        let content = match Content::decode(content) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to decode content stream: {}", e);
                return;
            }
        };

        let mut ctm = base;
        let mut saved = Vec::new();

        for operation in &content.operations {
            match operation.operator.as_str() {
                "q" => saved.push(ctm),
                "Q" => {
                    if let Some(previous) = saved.pop() {
                        ctm = previous;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(&operation.operands) {
                        ctm = m.concat(&ctm);
                    }
                }
                "Do" => {
                    if let Some(name) = operation.operands.first().and_then(|o| o.as_name().ok()) {
                        self.invoke(name, resources, path, ctm, depth);
                    }
                }
                _ => {}
            }
        }
    }

    fn invoke(
        &mut self,
        name: &[u8],
        resources: &'a Dictionary,
        path: &mut ResourcePath,
        ctm: Matrix,
        depth: usize,
    ) {
        let doc = self.doc;
        let Some(xobjects) = resolved_dict(doc, resources, b"XObject") else {
            return;
        };
        let Some(id) = xobjects.get(name).ok().and_then(|o| o.as_reference().ok()) else {
            return;
        };
        let Ok(stream) = doc.get_object(id).and_then(Object::as_stream) else {
            return;
        };

        match subtype(stream) {
            Some(b"Image") => {
                self.placements
                    .entry(resource_key(path, name))
                    .or_insert_with(|| ctm.unit_square_top());
            }
            Some(b"Form") if depth < MAX_DEPTH => {
                let matrix = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| o.as_array().ok())
                    .and_then(|items| Matrix::from_operands(items))
                    .unwrap_or(Matrix::IDENTITY);
                let content = stream_bytes(stream);
                let ctm = matrix.concat(&ctm);

                // A form without its own resources draws from its parent's
                match resolved_dict(doc, &stream.dict, b"Resources") {
                    Some(form_resources) => {
                        path.push(name.to_vec());
                        self.walk(&content, form_resources, path, ctm, depth + 1);
                        path.pop();
                    }
                    None => self.walk(&content, resources, path, ctm, depth + 1),
                }
            }
            _ => {}
        }
    }
}

/// Affine transform `[a b c d e f]` in PDF row-vector convention
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix([f32; 6]);

impl Matrix {
    const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() != 6 {
            return None;
        }
        let mut values = [0.0; 6];
        for (slot, operand) in values.iter_mut().zip(operands) {
            *slot = as_number(operand)?;
        }
        Some(Matrix(values))
    }

    /// `self` applied first, then `other`
    fn concat(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (a * x + c * y + e, b * x + d * y + f)
    }

    /// Highest y reached by the image unit square under this transform
    fn unit_square_top(&self) -> f32 {
        [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]
            .into_iter()
            .map(|(x, y)| self.apply(x, y).1)
            .fold(f32::MIN, f32::max)
    }
}

fn read_image(doc: &Document, stream: &Stream, page_index: usize, y_position: f32) -> PageImage {
    let dict = &stream.dict;

    let width = dict_u32(dict, b"Width");
    let height = dict_u32(dict, b"Height");
    let image_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));

    let bits_per_component = if image_mask {
        1
    } else {
        match dict.get(b"BitsPerComponent").ok().and_then(|o| o.as_i64().ok()) {
            None => 8,
            // Out-of-range depths land in the decoder's unsupported arm
            Some(bits) => u8::try_from(bits).unwrap_or(0),
        }
    };

    let color_space = if image_mask {
        ColorSpace::Gray
    } else {
        dict.get(b"ColorSpace")
            .map(|cs| parse_color_space(doc, cs, 0))
            .unwrap_or(ColorSpace::Gray)
    };

    let (encoding, data) = match last_filter(dict) {
        Some(b"DCTDecode") => (ImageEncoding::Jpeg, stream.content.clone()),
        Some(filter @ (b"JPXDecode" | b"JBIG2Decode" | b"CCITTFaxDecode")) => (
            ImageEncoding::Unsupported(String::from_utf8_lossy(filter).into_owned()),
            stream.content.clone(),
        ),
        _ => (ImageEncoding::Raw, stream_bytes(stream)),
    };

    PageImage {
        page_index,
        y_position,
        encoding,
        data,
        width,
        height,
        color_space,
        bits_per_component,
    }
}

fn parse_color_space(doc: &Document, obj: &Object, depth: usize) -> ColorSpace {
    let obj = resolve(doc, obj);

    match obj {
        Object::Name(name) => color_space_by_name(name),
        Object::Array(items) if depth < MAX_DEPTH => {
            match items.first().and_then(|o| o.as_name().ok()) {
                Some(b"ICCBased") => {
                    let components = items
                        .get(1)
                        .map(|o| resolve(doc, o))
                        .and_then(|o| o.as_stream().ok())
                        .and_then(|s| s.dict.get(b"N").ok())
                        .and_then(|n| n.as_i64().ok());
                    match components {
                        Some(1) => ColorSpace::Gray,
                        Some(3) => ColorSpace::Rgb,
                        Some(4) => ColorSpace::Cmyk,
                        other => ColorSpace::Other(format!("ICCBased N={:?}", other)),
                    }
                }
                Some(b"Indexed" | b"I") => {
                    let base = items
                        .get(1)
                        .map(|o| parse_color_space(doc, o, depth + 1))
                        .unwrap_or(ColorSpace::Rgb);
                    let hival = items
                        .get(2)
                        .and_then(|o| o.as_i64().ok())
                        .unwrap_or(255)
                        .clamp(0, 255) as u8;
                    let lookup = match items.get(3).map(|o| resolve(doc, o)) {
                        Some(Object::String(bytes, _)) => bytes.clone(),
                        Some(Object::Stream(s)) => stream_bytes(s),
                        _ => Vec::new(),
                    };
                    ColorSpace::Indexed {
                        base: Box::new(base),
                        hival,
                        lookup,
                    }
                }
                Some(name) => color_space_by_name(name),
                None => ColorSpace::Other("empty array".to_string()),
            }
        }
        other => ColorSpace::Other(format!("{:?}", other)),
    }
}

fn color_space_by_name(name: &[u8]) -> ColorSpace {
    match name {
        b"DeviceGray" | b"G" | b"CalGray" => ColorSpace::Gray,
        b"DeviceRGB" | b"RGB" | b"CalRGB" => ColorSpace::Rgb,
        b"DeviceCMYK" | b"CMYK" => ColorSpace::Cmyk,
        other => ColorSpace::Other(String::from_utf8_lossy(other).into_owned()),
    }
}

/// Top edge of the page box (CropBox, falling back to MediaBox)
fn page_top(doc: &Document, page_id: ObjectId) -> f32 {
    [b"CropBox".as_slice(), b"MediaBox".as_slice()]
        .into_iter()
        .find_map(|key| {
            let items = inherited(doc, page_id, key)?.as_array().ok()?;
            let y0 = as_number(resolve(doc, items.get(1)?))?;
            let y1 = as_number(resolve(doc, items.get(3)?))?;
            Some(y0.max(y1))
        })
        .unwrap_or(DEFAULT_PAGE_TOP)
}

/// Page attribute lookup following the page tree's `Parent` chain
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node_id = page_id;

    for _ in 0..MAX_DEPTH {
        let node = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        node_id = node.get(b"Parent").ok()?.as_reference().ok()?;
    }

    None
}

fn resolved_dict<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    dict.get(key).ok().map(|o| resolve(doc, o)).and_then(|o| o.as_dict().ok())
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    doc.dereference(obj).map(|(_, o)| o).unwrap_or(obj)
}

fn subtype(stream: &Stream) -> Option<&[u8]> {
    stream.dict.get(b"Subtype").ok()?.as_name().ok()
}

fn last_filter(dict: &Dictionary) -> Option<&[u8]> {
    match dict.get(b"Filter").ok()? {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(items) => items.last().and_then(|o| o.as_name().ok()),
        _ => None,
    }
}

fn stream_bytes(stream: &Stream) -> Vec<u8> {
    stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone())
}

fn dict_u32(dict: &Dictionary, key: &[u8]) -> u32 {
    dict.get(key)
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0)
        .clamp(0, u32::MAX as i64) as u32
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(v) => Some(*v as f32),
        Object::Real(v) => Some(*v as f32),
        _ => None,
    }
}

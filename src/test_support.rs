//! PDF fixtures built in memory with lopdf

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub const PAGE_WIDTH: i64 = 612;
pub const PAGE_HEIGHT: i64 = 792;

/// One page of a fixture document
#[derive(Default)]
pub struct PageSpec {
    pub text: Option<String>,
    pub images: Vec<ImageSpec>,
}

impl PageSpec {
    pub fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            images: Vec::new(),
        }
    }

    pub fn blank() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, image: ImageSpec) -> Self {
        self.images.push(image);
        self
    }
}

/// An image XObject and, optionally, the `cm` matrix it is drawn with
pub struct ImageSpec {
    stream: Stream,
    matrix: Option<[i64; 6]>,
}

impl ImageSpec {
    /// 8-bit grayscale checkerboard
    pub fn gray(width: i64, height: i64) -> Self {
        let data = (0..width * height)
            .map(|i| if i % 2 == 0 { 0u8 } else { 255u8 })
            .collect();
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
            },
            data,
        );
        Self { stream, matrix: None }
    }

    /// DCTDecode stream whose bytes are not a JPEG
    pub fn corrupt_jpeg() -> Self {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 16,
                "Height" => 16,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            b"\xff\xd8 this is not really jpeg data".to_vec(),
        );
        Self { stream, matrix: None }
    }

    /// Draw the image with `[a b c d e f] cm`
    pub fn at(mut self, matrix: [i64; 6]) -> Self {
        self.matrix = Some(matrix);
        self
    }
}

/// Serialize a fixture document
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let mut operations = Vec::new();
        let mut xobjects = Dictionary::new();

        if let Some(text) = &page.text {
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), (PAGE_HEIGHT - 72).into()]),
                Operation::new("Tj", vec![Object::string_literal(text.as_str())]),
                Operation::new("ET", vec![]),
            ]);
        }

        for (index, image) in page.images.iter().enumerate() {
            let name = format!("Im{}", index);
            let image_id = doc.add_object(image.stream.clone());
            xobjects.set(name.as_bytes().to_vec(), image_id);

            if let Some(matrix) = image.matrix {
                operations.push(Operation::new("q", vec![]));
                operations.push(Operation::new(
                    "cm",
                    matrix.iter().map(|&v| Object::Integer(v)).collect(),
                ));
                operations.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
                operations.push(Operation::new("Q", vec![]));
            }
        }

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("encode content stream"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
                "XObject" => xobjects,
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).expect("serialize fixture PDF");
    buffer
}

/// Write a fixture document to `dir/fixture.pdf`
pub fn write_pdf(dir: &Path, pages: &[PageSpec]) -> PathBuf {
    let path = dir.join("fixture.pdf");
    std::fs::write(&path, build_pdf(pages)).expect("write fixture PDF");
    path
}

/// Point `startxref` at a bogus offset, leaving every object intact
pub fn break_startxref(mut bytes: Vec<u8>) -> Vec<u8> {
    let marker = b"startxref";
    let position = bytes
        .windows(marker.len())
        .rposition(|window| window == marker)
        .expect("fixture has startxref");
    bytes.truncate(position + marker.len());
    bytes.extend_from_slice(b"\n12\n%%EOF\n");
    bytes
}

//! PDF assembly: one-page image documents and whole-document concatenation
//!
//! The pipeline only needs two operations from its PDF collaborator: put one
//! JPEG onto a single A4 page, and append whole documents in order. Both are
//! implemented on top of lopdf. JPEG bytes are embedded as a DCTDecode image
//! XObject, so the image data itself is never decoded; only the frame header
//! is scanned for dimensions and the component count.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{MergerError, Result};

/// A4 page size in PDF points
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;

/// Fixed layout: 10 mm inset from the left and top edges, 100 mm render
/// width, aspect ratio preserved.
const INSET: f32 = 28.35;
const RENDER_WIDTH: f32 = 283.46;

/// The two PDF operations the pipeline delegates to its render collaborator
#[cfg_attr(test, mockall::automock)]
pub trait PdfEngine: Send + Sync {
    /// Produce a complete single-page PDF containing the given JPEG
    fn render_image_page(&self, image: &[u8]) -> Result<Vec<u8>>;

    /// Append the pages of every input, in sequence order, into one
    /// document written to `output`
    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()>;
}

/// lopdf-backed implementation of [`PdfEngine`]
#[derive(Debug, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl PdfEngine for LopdfEngine {
    fn render_image_page(&self, image: &[u8]) -> Result<Vec<u8>> {
        let info = jpeg_frame_info(image)?;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let color_space = match info.components {
            1 => "DeviceGray",
            4 => "DeviceCMYK",
            _ => "DeviceRGB",
        };

        // The JPEG stream goes in as-is; DCTDecode leaves decoding to the
        // viewer and re-compressing it would only grow the file.
        let image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => info.width as i64,
                "Height" => info.height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            image.to_vec(),
        )
        .with_compression(false);
        let image_id = doc.add_object(image_stream);

        let draw_height = RENDER_WIDTH * info.height as f32 / info.width as f32;
        let origin_y = PAGE_HEIGHT - INSET - draw_height;

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        RENDER_WIDTH.into(),
                        0.into(),
                        0.into(),
                        draw_height.into(),
                        INSET.into(),
                        origin_y.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => Object::Reference(image_id),
                },
            },
        });

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes)?;
        Ok(bytes)
    }

    fn merge(&self, inputs: &[PathBuf], output: &Path) -> Result<()> {
        let mut merged = Document::with_version("1.5");
        let mut max_id = 1u32;
        // Page order must survive the merge exactly: input order, then page
        // order within each input.
        let mut page_objects: Vec<(ObjectId, Object)> = Vec::new();
        let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

        for path in inputs {
            let mut doc = Document::load(path)?;
            doc.renumber_objects_with(max_id);
            max_id = doc.max_id + 1;

            for (_page_no, page_id) in doc.get_pages() {
                let page = doc.get_object(page_id)?.to_owned();
                page_objects.push((page_id, page));
            }
            all_objects.append(&mut doc.objects);
        }

        // Carry every object over except the old catalogs and page trees;
        // pages themselves are reparented below.
        for (id, object) in all_objects {
            match object_type(&object) {
                Some(b"Catalog") | Some(b"Pages") | Some(b"Page") | Some(b"Outlines") => {}
                _ => {
                    merged.objects.insert(id, object);
                }
            }
        }

        merged.max_id = max_id;
        let pages_id = merged.new_object_id();

        let kids: Vec<Object> = page_objects
            .iter()
            .map(|(id, _)| Object::Reference(*id))
            .collect();
        let page_count = kids.len() as i64;

        for (id, object) in page_objects {
            if let Object::Dictionary(mut dict) = object {
                dict.set("Parent", Object::Reference(pages_id));
                merged.objects.insert(id, Object::Dictionary(dict));
            }
        }

        merged.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );

        let catalog_id = merged.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        merged.trailer.set("Root", catalog_id);
        merged.max_id = merged.objects.len() as u32;
        merged.renumber_objects();
        merged.compress();
        merged.save(output)?;
        Ok(())
    }
}

fn object_type(object: &Object) -> Option<&[u8]> {
    object
        .as_dict()
        .ok()
        .and_then(|dict| dict.get(b"Type").ok())
        .and_then(|ty| ty.as_name().ok())
}

struct JpegFrameInfo {
    width: u16,
    height: u16,
    components: u8,
}

/// Scan the JPEG marker stream for the SOF frame header and read the pixel
/// dimensions and component count. The compressed image data is not touched.
fn jpeg_frame_info(data: &[u8]) -> Result<JpegFrameInfo> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return Err(MergerError::InvalidImage(
            "missing JPEG SOI marker".to_string(),
        ));
    }

    let mut pos = 2;
    while pos + 3 < data.len() {
        if data[pos] != 0xFF {
            return Err(MergerError::InvalidImage(
                "corrupt JPEG marker stream".to_string(),
            ));
        }
        // Fill bytes before a marker are legal
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        let marker = data[pos + 1];

        match marker {
            // Standalone markers carry no segment length
            0x01 | 0xD0..=0xD8 => pos += 2,
            // End of image without a frame header
            0xD9 => break,
            // SOF0..SOF15, excluding the non-frame C4/C8/CC markers
            0xC0..=0xCF if marker != 0xC4 && marker != 0xC8 && marker != 0xCC => {
                if pos + 9 >= data.len() {
                    return Err(MergerError::InvalidImage(
                        "truncated JPEG frame header".to_string(),
                    ));
                }
                let height = u16::from_be_bytes([data[pos + 5], data[pos + 6]]);
                let width = u16::from_be_bytes([data[pos + 7], data[pos + 8]]);
                let components = data[pos + 9];
                if width == 0 || height == 0 {
                    return Err(MergerError::InvalidImage(
                        "JPEG frame header declares zero dimensions".to_string(),
                    ));
                }
                return Ok(JpegFrameInfo {
                    width,
                    height,
                    components,
                });
            }
            _ => {
                let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
                if length < 2 {
                    return Err(MergerError::InvalidImage(
                        "invalid JPEG segment length".to_string(),
                    ));
                }
                pos += 2 + length;
            }
        }
    }

    Err(MergerError::InvalidImage(
        "no JPEG frame header found".to_string(),
    ))
}

/// Minimal JPEG marker stream: SOI, SOF0 with the given dimensions, EOI.
/// The engine never decodes image data, so this is enough to exercise it.
#[cfg(test)]
pub(crate) fn fake_jpeg(width: u16, height: u16) -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08]);
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&width.to_be_bytes());
    data.push(0x03);
    data.extend_from_slice(&[0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

//! In-memory PDF fixtures built with lopdf.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::codecs::jpeg::JpegEncoder;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// What goes on one fixture page.
#[derive(Debug, Clone)]
pub enum PageSpec {
    /// A single text run.
    Text(String),
    /// A full-page grayscale image (Flate-compressed samples), no text.
    Scanned,
    /// A full-page JPEG image, no text.
    ScannedJpeg,
    /// A full-page bilevel image (CCITT Group 4), no text.
    ScannedFax,
    /// A full-page grayscale image on a 200 x 260 inch page.
    Poster,
    /// A page whose /Contents is not a stream.
    Broken,
    /// Text plus a full-page image.
    TextAndImage(String),
    /// No content at all.
    Blank,
}

const TEXT_BOX: [i64; 4] = [0, 0, 612, 792];
const SCAN_BOX: [i64; 4] = [0, 0, 200, 260];
const POSTER_BOX: [i64; 4] = [0, 0, 14_400, 18_720];

/// Serialize a document with one page per spec.
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for spec in pages {
        let page_id = add_page(&mut doc, pages_id, font_id, spec);
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// `n` pages of text, each `chars` characters long and tagged with its page
/// number.
pub fn text_pages(n: usize, chars: usize) -> Vec<PageSpec> {
    (1..=n)
        .map(|i| PageSpec::Text(page_text(i, chars)))
        .collect()
}

/// Deterministic prose of exactly `chars` characters starting with a page tag.
pub fn page_text(page: usize, chars: usize) -> String {
    let mut text = format!("Page{} body. ", page);
    let filler = "Parliament enacts laws on subjects in the Union List. ";
    while text.len() < chars {
        text.push_str(filler);
    }
    text.truncate(chars);
    text.trim_end().to_string()
}

fn add_page(doc: &mut Document, pages_id: ObjectId, font_id: ObjectId, spec: &PageSpec) -> ObjectId {
    let mut resources = dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    };
    let mut ops = Vec::new();
    let mut media_box = TEXT_BOX;

    match spec {
        PageSpec::Text(text) => ops.extend(text_ops(text)),
        PageSpec::Scanned | PageSpec::ScannedJpeg | PageSpec::ScannedFax | PageSpec::Poster => {
            media_box = if matches!(spec, PageSpec::Poster) {
                POSTER_BOX
            } else {
                SCAN_BOX
            };
            let image_id = match spec {
                PageSpec::Scanned | PageSpec::Poster => add_gray_image(doc, 40, 52),
                PageSpec::ScannedJpeg => add_jpeg_image(doc, 40, 52),
                _ => add_fax_image(doc),
            };
            resources.set("XObject", dictionary! { "Im1" => image_id });
            ops.extend(image_ops(media_box));
        }
        PageSpec::TextAndImage(text) => {
            let image_id = add_gray_image(doc, 40, 52);
            resources.set("XObject", dictionary! { "Im1" => image_id });
            ops.extend(image_ops(media_box));
            ops.extend(text_ops(text));
        }
        PageSpec::Broken | PageSpec::Blank => {}
    }

    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => resources,
        "MediaBox" => media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
    };

    match spec {
        PageSpec::Broken => page.set("Contents", Object::Integer(42)),
        PageSpec::Blank => {}
        _ => {
            let content = Content { operations: ops };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            page.set("Contents", content_id);
        }
    }

    doc.add_object(page)
}

fn text_ops(text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), Object::Integer(10)]),
        Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

fn image_ops(media_box: [i64; 4]) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                Object::Integer(media_box[2]),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(media_box[3]),
                Object::Integer(0),
                Object::Integer(0),
            ],
        ),
        Operation::new("Do", vec!["Im1".into()]),
        Operation::new("Q", vec![]),
    ]
}

/// Gray stripes, like lines of scanned print.
fn stripes(width: u32, height: u32) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |_| if y % 4 == 0 { 20 } else { 235 }))
        .collect()
}

fn add_gray_image(doc: &mut Document, width: u32, height: u32) -> ObjectId {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&stripes(width, height)).unwrap();
    let compressed = encoder.finish().unwrap();

    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(width as i64),
            "Height" => Object::Integer(height as i64),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "FlateDecode",
        },
        compressed,
    ))
}

fn add_jpeg_image(doc: &mut Document, width: u32, height: u32) -> ObjectId {
    let gray = stripes(width, height);
    let rgb = image::RgbImage::from_fn(width, height, |x, y| {
        let v = gray[(y * width + x) as usize];
        image::Rgb([v, v, v])
    });
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, 90)
        .encode_image(&rgb)
        .unwrap();

    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(width as i64),
            "Height" => Object::Integer(height as i64),
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => Object::Integer(8),
            "Filter" => "DCTDecode",
        },
        jpeg,
    ))
}

/// An 8x8 all-black bilevel image, Group 4 encoded: one horizontal-mode
/// row, seven vertical-mode rows copying it, then end-of-block.
const FAX_G4_BLACK_8X8: [u8; 7] = [0x26, 0xA2, 0xFF, 0xFE, 0x00, 0x20, 0x02];

fn add_fax_image(doc: &mut Document) -> ObjectId {
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(8),
            "Height" => Object::Integer(8),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(1),
            "Filter" => "CCITTFaxDecode",
            "DecodeParms" => dictionary! {
                "K" => Object::Integer(-1),
                "Columns" => Object::Integer(8),
                "Rows" => Object::Integer(8),
            },
        },
        FAX_G4_BLACK_8X8.to_vec(),
    ))
}

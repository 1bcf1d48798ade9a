use printpdf::{
    image_crate, BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocument, PdfLayerReference, Point, Rgb,
};
use std::io::Cursor;
use std::time::Duration;
use thiserror::Error;

use crate::entities::lead;

const PAGE_WIDTH_MM: f32 = 215.9; //US letter
const PAGE_HEIGHT_MM: f32 = 279.4;
const MARGIN_MM: f32 = 18.0;
const ROW_HEIGHT_MM: f32 = 9.0;
const LABEL_COLUMN_MM: f32 = 54.0;

const IMAGE_FETCH_TIMEOUT_SECS: u64 = 5;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to render PDF: {0}")]
    Pdf(#[from] printpdf::Error),
}

//Best-effort: any network failure, non-2xx status or timeout collapses to
//None and the caller renders the placeholder line instead.
pub async fn fetch_lead_image(url: &str) -> Option<Vec<u8>> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(IMAGE_FETCH_TIMEOUT_SECS))
        .build()
        .ok()?;

    let response = client.get(url).send().await.ok()?;
    if !response.status().is_success() {
        return None;
    }

    response.bytes().await.ok().map(|bytes| bytes.to_vec())
}

//Pure rendering over an already-loaded lead. `image_bytes` is whatever the
//fetch produced; decoding failures degrade to the placeholder, never to an
//error for the whole document.
pub fn render_lead_pdf(
    lead: &lead::Model,
    image_bytes: Option<&[u8]>,
) -> Result<Vec<u8>, ExportError> {
    let (doc, page, layer) = PdfDocument::new(
        "Lead Details Report",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let current_layer = doc.get_page(page).get_layer(layer);

    let font = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
    let font_italic = doc.add_builtin_font(BuiltinFont::HelveticaOblique)?;

    //Title and the rule under it
    current_layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.55, None)));
    current_layer.use_text(
        "Lead Details Report",
        20.0,
        Mm(70.0),
        Mm(PAGE_HEIGHT_MM - 20.0),
        &font_bold,
    );
    current_layer.set_outline_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    current_layer.set_outline_thickness(1.0);
    current_layer.add_line(horizontal_line(
        MARGIN_MM,
        PAGE_WIDTH_MM - MARGIN_MM,
        PAGE_HEIGHT_MM - 23.0,
    ));

    //Bordered key/value grid of the lead's fields
    let details = [
        ("Name:", lead.name.clone()),
        ("Location:", lead.location.clone()),
        ("Property Type:", lead.property_type.clone()),
        ("Property Status:", lead.property_status.clone()),
        ("Service Required On:", lead.service_required_on.clone()),
        ("Budget:", format!("Rs {:.2}", lead.budget)),
        ("Requirement:", lead.requirement.clone()),
        ("Tags:", lead.tags.clone().unwrap_or_else(|| "N/A".into())),
        ("Price:", price_line(lead.price, lead.discount_price)),
    ];

    let table_top = PAGE_HEIGHT_MM - 32.0;
    let table_bottom = table_top - ROW_HEIGHT_MM * details.len() as f32;
    let left = MARGIN_MM;
    let right = PAGE_WIDTH_MM - MARGIN_MM;
    let split = left + LABEL_COLUMN_MM;

    current_layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
    current_layer.set_outline_color(Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None)));
    current_layer.set_outline_thickness(0.75);

    for (i, (label, value)) in details.iter().enumerate() {
        let row_top = table_top - ROW_HEIGHT_MM * i as f32;
        let baseline = row_top - 6.0;
        current_layer.use_text(*label, 11.0, Mm(left + 2.0), Mm(baseline), &font_bold);
        current_layer.use_text(value.clone(), 11.0, Mm(split + 2.0), Mm(baseline), &font);
        current_layer.add_line(horizontal_line(left, right, row_top));
    }
    current_layer.add_line(horizontal_line(left, right, table_bottom));
    current_layer.add_line(vertical_line(left, table_bottom, table_top));
    current_layer.add_line(vertical_line(split, table_bottom, table_top));
    current_layer.add_line(vertical_line(right, table_bottom, table_top));

    //Property image, only when the lead references one
    if lead.image_url.is_some() {
        draw_image_section(&current_layer, &font, image_bytes, table_bottom);
    }

    //Footer
    current_layer.set_fill_color(Color::Rgb(Rgb::new(0.5, 0.5, 0.5, None)));
    current_layer.use_text(
        "Generated by Interior Leads System | (c) 2025",
        10.0,
        Mm(70.0),
        Mm(10.0),
        &font_italic,
    );

    Ok(doc.save_to_bytes()?)
}

fn draw_image_section(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    image_bytes: Option<&[u8]>,
    table_bottom: f32,
) {
    let caption_y = table_bottom - 85.0;

    match image_bytes.and_then(decode_image) {
        Some(image) => {
            image.add_to_layer(
                layer.clone(),
                ImageTransform {
                    translate_x: Some(Mm(70.0)),
                    translate_y: Some(Mm(caption_y + 8.0)),
                    dpi: Some(150.0),
                    ..Default::default()
                },
            );
            layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
            layer.use_text("Property Image", 10.0, Mm(88.0), Mm(caption_y), font);
        }
        None => {
            layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
            layer.use_text(
                "Image could not be loaded.",
                10.0,
                Mm(70.0),
                Mm(caption_y),
                font,
            );
        }
    }
}

fn decode_image(bytes: &[u8]) -> Option<Image> {
    let format = image_crate::guess_format(bytes).ok()?;
    let cursor = Cursor::new(bytes);

    match format {
        image_crate::ImageFormat::Jpeg => {
            Image::try_from(image_crate::codecs::jpeg::JpegDecoder::new(cursor).ok()?).ok()
        }
        image_crate::ImageFormat::Png => {
            Image::try_from(image_crate::codecs::png::PngDecoder::new(cursor).ok()?).ok()
        }
        image_crate::ImageFormat::Bmp => {
            Image::try_from(image_crate::codecs::bmp::BmpDecoder::new(cursor).ok()?).ok()
        }
        _ => None,
    }
}

fn price_line(price: Option<f32>, discount_price: Option<f32>) -> String {
    match (price, discount_price) {
        (Some(price), Some(discount)) => {
            format!("Rs {:.2} (Discounted: Rs {:.2})", price, discount)
        }
        (Some(price), None) => format!("Rs {:.2}", price),
        (None, Some(discount)) => format!("Rs {:.2}", discount),
        (None, None) => "N/A".into(),
    }
}

fn horizontal_line(x1: f32, x2: f32, y: f32) -> Line {
    Line {
        points: vec![
            (Point::new(Mm(x1), Mm(y)), false),
            (Point::new(Mm(x2), Mm(y)), false),
        ],
        is_closed: false,
    }
}

fn vertical_line(x: f32, y1: f32, y2: f32) -> Line {
    Line {
        points: vec![
            (Point::new(Mm(x), Mm(y1)), false),
            (Point::new(Mm(x), Mm(y2)), false),
        ],
        is_closed: false,
    }
}

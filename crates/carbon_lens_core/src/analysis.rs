//! Calls into the vision and barcode collaborators.
//!
//! Collaborator failures never reach the caller: they are logged and treated
//! as "nothing detected".

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use crate::domain::{AnalyzedObject, ScanKind, Symbology};
use crate::ports::{BarcodeLookupService, VisionAnalysisService};

const RESPONSE_FORMAT: &str = r#"Respond with ONLY a JSON array, no prose. Each element must be:
{"name": string, "category": one of "food","beverage","product","clothing","electronics","household","packaging","transport","energy","other", "carbon_kg": number, "confidence": number between 0 and 1}
Use an empty array [] if nothing can be identified."#;

const PRODUCT_INSTRUCTION: &str = "Identify each distinct product visible in this photo and estimate its cradle-to-shelf carbon footprint in kilograms of CO2e for one unit.";

const MEAL_INSTRUCTION: &str = "Identify each ingredient or dish in this meal and estimate the carbon footprint in kilograms of CO2e of the portion shown.";

const RECEIPT_INSTRUCTION: &str = "Read this shopping receipt. For each purchased line item, estimate the carbon footprint in kilograms of CO2e of the quantity bought. Use the item's plain name, not the store code.";

/// The natural-language instruction sent with an image of the given kind.
pub fn instruction_for(kind: ScanKind) -> String {
    let task = match kind {
        ScanKind::Meal => MEAL_INSTRUCTION,
        ScanKind::Receipt => RECEIPT_INSTRUCTION,
        _ => PRODUCT_INSTRUCTION,
    };
    format!("{}\n\n{}", task, RESPONSE_FORMAT)
}

/// Sends an image to the vision service. Failures yield an empty list.
pub async fn analyze_image(
    vision: &dyn VisionAnalysisService,
    image: &[u8],
    kind: ScanKind,
) -> Vec<AnalyzedObject> {
    if image.is_empty() {
        debug!("Empty image payload; skipping vision analysis.");
        return Vec::new();
    }
    let encoded = STANDARD.encode(image);
    match vision.analyze(&encoded, &instruction_for(kind)).await {
        Ok(objects) => objects,
        Err(e) => {
            warn!(kind = kind.as_str(), "Vision analysis failed, treating as no objects: {}", e);
            Vec::new()
        }
    }
}

/// Looks up a barcode. Failures yield an empty list.
pub async fn lookup_barcode(
    barcodes: &dyn BarcodeLookupService,
    code: &str,
    symbology: Symbology,
) -> Vec<AnalyzedObject> {
    let code = code.trim();
    if code.is_empty() {
        return Vec::new();
    }
    match barcodes.lookup(code, symbology).await {
        Ok(objects) => objects,
        Err(e) => {
            warn!(code, "Barcode lookup failed, treating as no objects: {}", e);
            Vec::new()
        }
    }
}

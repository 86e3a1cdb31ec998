use rust_decimal::Decimal;

use crate::NewProduct;

/// (name, price in cents, image file)
const STARTER: [(&str, i64, &str); 11] = [
    ("Skol Lata 250ml", 220, "skol_lata_350ml.jpg"),
    ("Heineken 600ml", 750, "heineken_600ml.jpg"),
    ("Antarctica Pilsen 300ml", 249, "antarctica_pilsen_300ml.jpg"),
    ("Brahma 600ml", 750, "brahma_600ml.jpg"),
    ("Skol 269ml", 219, "skol_269ml.jpg"),
    ("Skol Beats Senses 313ml", 449, "skol_beats_senses_313ml.jpg"),
    ("Becks 330ml", 499, "becks_330ml.jpg"),
    ("Brahma Duplo Malte 350ml", 279, "brahma_duplo_malte_350ml.jpg"),
    ("Becks 600ml", 889, "becks_600ml.jpg"),
    ("Skol Beats Senses 269ml", 357, "skol_beats_senses_269ml.jpg"),
    ("Stella Artois 275ml", 349, "stella_artois_275ml.jpg"),
];

/// Products loaded into an empty catalog at start-up.
///
/// `image_base_url` is the public prefix under which the image files are
/// served (for example `http://localhost:3001/images`).
pub fn starter_catalog(image_base_url: &str) -> Vec<NewProduct> {
    let base = image_base_url.trim_end_matches('/');
    STARTER
        .iter()
        .map(|(name, cents, image)| NewProduct {
            name: name.to_string(),
            price: Decimal::new(*cents, 2),
            url_image: format!("{base}/{image}"),
        })
        .collect()
}

use super::profile::TagProfile;

/// Cosine similarity between a customer's tag profile and a product's tag
/// set, in [0.0, 1.0].
///
/// The product is treated as a binary incidence vector: weight 1 for each
/// tag it carries. Only the product's own tags contribute to the numerator
/// and the product-side norm; the profile-side norm ranges over the whole
/// profile. Returns exactly 0.0 when the product has no tags or the
/// profile carries no signal, rather than dividing by zero.
pub fn cosine_similarity(profile: &TagProfile, product_tags: &[String]) -> f64 {
    if product_tags.is_empty() || profile.is_empty() {
        return 0.0;
    }

    let mut numerator = 0.0;
    let mut denom_product = 0.0;
    for tag in product_tags {
        numerator += profile.weight(tag);
        denom_product += 1.0;
    }

    let denom_profile: f64 = profile.iter().map(|(_, w)| w * w).sum();

    numerator / (denom_product * denom_profile).sqrt()
}

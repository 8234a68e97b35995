use crate::{
    error::PortalError,
    models::{Recette, RecetteDraft, RecetteKind, RecettePage, RecetteQuery},
};

/// Rows per page on the configuration screen.
pub const RECETTES_PER_PAGE: usize = 5;

/// Rejects a draft with an empty code, label or category.
pub fn validate(draft: &RecetteDraft) -> Result<(), PortalError> {
    let required = [&draft.code, &draft.label, &draft.category];
    if required.iter().any(|field| field.trim().is_empty()) {
        return Err(PortalError::Validation);
    }
    Ok(())
}

fn is_listed(recette: &Recette, kind: RecetteKind, needle: &str) -> bool {
    recette.kind == kind
        && (needle.is_empty()
            || [&recette.label, &recette.code, &recette.category]
                .iter()
                .any(|field| field.to_lowercase().contains(needle)))
}

/// select
///
/// One page of the recettes on the requested tab that match the search text. The page is
/// clamped into the available range, so an out-of-range page shows the last one and an
/// empty result still reports page 1.
pub fn select(recettes: &[Recette], query: &RecetteQuery) -> RecettePage {
    let kind = query.kind.unwrap_or(RecetteKind::Fiscale);
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .unwrap_or_default()
        .to_lowercase();

    let filtered: Vec<&Recette> = recettes
        .iter()
        .filter(|recette| is_listed(recette, kind, &needle))
        .collect();

    let total = filtered.len();
    let total_pages = total.div_ceil(RECETTES_PER_PAGE);
    let page = query.page.unwrap_or(1).clamp(1, total_pages.max(1));

    RecettePage {
        items: filtered
            .into_iter()
            .skip((page - 1) * RECETTES_PER_PAGE)
            .take(RECETTES_PER_PAGE)
            .cloned()
            .collect(),
        page,
        per_page: RECETTES_PER_PAGE,
        total,
        total_pages,
    }
}

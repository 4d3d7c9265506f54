use serde::Serialize;

use crate::api::ApiResponse;
use crate::domain::CategoryLabel;

#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
    pub is_default: bool,
}

/// Category labels the parser may assign, with the keywords that select them.
pub async fn list_categories() -> ApiResponse<Vec<CategoryInfo>> {
    let categories = CategoryLabel::ALL
        .iter()
        .map(|category| CategoryInfo {
            label: category.label(),
            keywords: category.keywords(),
            is_default: *category == CategoryLabel::DEFAULT,
        })
        .collect();

    ApiResponse::new(categories)
}

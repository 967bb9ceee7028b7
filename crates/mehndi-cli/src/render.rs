//! Plain-text rendering of catalog read models.

use mehndi_core::{
    category_label, CatalogImageRecord, CategoryIndex, Page, ReadModel, ServiceTabView,
};

pub fn gallery_page(category: &str, page: &Page<CatalogImageRecord>) -> String {
    let mut out = format!(
        "{} designs: page {}/{} ({} total)\n",
        category_label(category),
        page.page,
        page.total_pages,
        page.total_items
    );
    if page.items.is_empty() {
        out.push_str("  No designs in this category yet.\n");
    }
    for image in &page.items {
        out.push_str(&image_line(image));
    }
    out
}

pub fn carousel(model: &ReadModel<CatalogImageRecord>) -> String {
    let window = model.carousel();
    let mut out = format!(
        "{} carousel ({} slides)\n",
        category_label(&model.active_category),
        window.len()
    );
    for (position, image) in window.iter().enumerate() {
        let marker = if position == model.active_index { ">" } else { " " };
        out.push_str(&format!("{}{}", marker, image_line(image)));
    }
    match model.current_slide() {
        Some(slide) => out.push_str(&format!("Current: {} ({})\n", slide.alt_text, slide.image_url)),
        None => out.push_str("Current: none\n"),
    }
    out
}

pub fn service_tab(tabs: &[String], view: &ServiceTabView) -> String {
    let header: Vec<String> = tabs
        .iter()
        .map(|tab| {
            if *tab == view.tab {
                format!("[{}]", category_label(tab))
            } else {
                category_label(tab)
            }
        })
        .collect();
    let mut out = format!("{}\n", header.join(" | "));

    match &view.service {
        Some(service) => {
            out.push_str(&format!("{}  {}\n", service.title, service.price));
            if !service.description.is_empty() {
                out.push_str(&format!("  {}\n", service.description));
            }
        }
        None => out.push_str("No service packages available.\n"),
    }

    out.push_str(&format!("Gallery ({} designs)\n", view.images.len()));
    for image in view.images.iter() {
        out.push_str(&image_line(image));
    }
    out
}

pub fn category_counts(tabs: &[String], index: &CategoryIndex<CatalogImageRecord>) -> String {
    tabs.iter()
        .map(|tab| format!("{:<14}{:>4}\n", category_label(tab), index.count(tab)))
        .collect()
}

fn image_line(image: &CatalogImageRecord) -> String {
    format!(" {:<16} {}  {}\n", image.id, image.image_url, image.alt_text)
}

//! Inline SVG icons keyed by tag

macro_rules! icon {
    ($body:literal) => {
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="24" height="24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" aria-hidden="true">"#,
            $body,
            "</svg>"
        )
    };
}

/// Shown for any tag not in [`ICONS`]
pub const DEFAULT_ICON: &str = icon!(r#"<circle cx="12" cy="12" r="9"/><path d="M12 8v8M8 12h8"/>"#);

pub static ICONS: &[(&str, &str)] = &[
    ("award", icon!(r#"<circle cx="12" cy="8" r="6"/><path d="M8.2 13.3 7 22l5-3 5 3-1.2-8.7"/>"#)),
    ("briefcase", icon!(r#"<rect x="2" y="7" width="20" height="14" rx="2"/><path d="M16 7V5a2 2 0 0 0-2-2h-4a2 2 0 0 0-2 2v2"/>"#)),
    ("chart", icon!(r#"<path d="M3 3v18h18"/><path d="m7 15 4-4 3 3 5-6"/>"#)),
    ("cloud", icon!(r#"<path d="M17.5 19a4.5 4.5 0 1 0-1.4-8.8A6 6 0 0 0 4 12a4 4 0 0 0 1 7.9z"/>"#)),
    ("code", icon!(r#"<path d="m16 18 6-6-6-6"/><path d="m8 6-6 6 6 6"/>"#)),
    ("database", icon!(r#"<ellipse cx="12" cy="5" rx="9" ry="3"/><path d="M3 5v14c0 1.7 4 3 9 3s9-1.3 9-3V5"/><path d="M3 12c0 1.7 4 3 9 3s9-1.3 9-3"/>"#)),
    ("mobile", icon!(r#"<rect x="5" y="2" width="14" height="20" rx="2"/><path d="M12 18h.01"/>"#)),
    ("palette", icon!(r#"<circle cx="13.5" cy="6.5" r="1"/><circle cx="17.5" cy="10.5" r="1"/><circle cx="8.5" cy="7.5" r="1"/><path d="M12 2a10 10 0 0 0 0 20c1 0 1.5-.7 1.5-1.5 0-.4-.2-.8-.4-1.1-.3-.3-.4-.6-.4-1 0-.8.7-1.4 1.5-1.4H16a6 6 0 0 0 6-6c0-5-4.5-9-10-9z"/>"#)),
    ("pen", icon!(r#"<path d="M12 20h9"/><path d="M16.5 3.5a2.1 2.1 0 1 1 3 3L7 19l-4 1 1-4z"/>"#)),
    ("server", icon!(r#"<rect x="2" y="2" width="20" height="8" rx="2"/><rect x="2" y="14" width="20" height="8" rx="2"/><path d="M6 6h.01M6 18h.01"/>"#)),
    ("shield", icon!(r#"<path d="M12 22s8-4 8-10V5l-8-3-8 3v7c0 6 8 10 8 10z"/>"#)),
    ("star", icon!(r#"<path d="m12 2 3.1 6.3 6.9 1-5 4.9 1.2 6.8L12 17.8 5.8 21l1.2-6.8-5-4.9 6.9-1z"/>"#)),
    ("users", icon!(r#"<path d="M16 21v-2a4 4 0 0 0-4-4H6a4 4 0 0 0-4 4v2"/><circle cx="9" cy="7" r="4"/><path d="M22 21v-2a4 4 0 0 0-3-3.9M16 3.1a4 4 0 0 1 0 7.8"/>"#)),
];

/// SVG for `tag`, case-insensitive, falling back to [`DEFAULT_ICON`]
pub fn icon_for(tag: &str) -> &'static str {
    let tag = tag.trim();
    ICONS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(tag))
        .map(|(_, svg)| *svg)
        .unwrap_or(DEFAULT_ICON)
}

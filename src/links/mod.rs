use anyhow::{Context, Result};
use serde::Serialize;

/// A third-party valuation site worth cross-checking against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReferenceLink {
    pub label: &'static str,
    pub url: &'static str,
    pub description: &'static str,
}

pub const REFERENCE_LINKS: [ReferenceLink; 4] = [
    ReferenceLink {
        label: "Autotrader UK",
        url: "https://www.autotrader.co.uk/cars/valuation",
        description: "Daily updated valuations",
    },
    ReferenceLink {
        label: "Parkers",
        url: "https://www.parkers.co.uk/car-valuation/",
        description: "Independent pricing since 1972",
    },
    ReferenceLink {
        label: "HPI Check",
        url: "https://www.hpi.co.uk/car-valuation.html",
        description: "Industry benchmark",
    },
    ReferenceLink {
        label: "Motorway",
        url: "https://motorway.co.uk/car-value-tracker",
        description: "Live market tracker",
    },
];

/// Look up a reference link by its 1-based index, as shown by `links`.
pub fn link_at(index: usize) -> Option<&'static ReferenceLink> {
    index.checked_sub(1).and_then(|i| REFERENCE_LINKS.get(i))
}

/// Open a URL in the user's default browser
///
/// # Errors
/// Returns error if browser cannot be opened (e.g., no browser available)
pub fn open_url(url: &str) -> Result<()> {
    webbrowser::open(url)
        .with_context(|| format!("Failed to open browser for URL: {}", url))?;
    Ok(())
}

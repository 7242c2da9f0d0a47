//! Run a selector across every frame of a saved CDP snapshot
//!
//! The snapshot is the JSON result of `DOM.getDocument { depth: -1, pierce: true }`.
//!
//! ```text
//! cargo run -p frame-finder --example find_in_snapshot -- page.json "form button" [max_depth]
//! ```

use dom::{DomService, Element};
use frame_finder::{FrameFinder, SearchOptions};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: find_in_snapshot <snapshot.json> <selector> [max_depth]")?;
    let selector = args.next().ok_or("missing selector")?;
    let max_depth = args.next().map(|d| d.parse::<usize>()).transpose()?;

    let json = std::fs::read_to_string(&path)?;
    let mut service = DomService::new();
    service.parse_cdp_json(&json)?;

    let top = service.top_document()?;
    println!("Loaded {} ({} nodes)", top.url().unwrap_or("<no url>"), service.arena().len());

    let finder = FrameFinder::new(top);
    let mut options = SearchOptions::new();
    if let Some(max_depth) = max_depth {
        options = options.max_depth(max_depth);
    }

    let found = finder.find_all_elements(&selector, options)?;
    println!("{} match(es) for '{}'", found.len(), selector);

    for element in &found {
        let document = element.owner_document()?;
        println!(
            "  <{}> id={:?} in {}",
            element.tag_name().to_lowercase(),
            element.id(),
            document.url().unwrap_or("<no url>")
        );
    }

    Ok(())
}

use crate::crawler::CrawlReport;

/// Largest number of new records listed individually in the report
const MAX_LISTED: usize = 25;

/// Prints the end-of-run report to stdout
pub fn print_run_report(report: &CrawlReport) {
    let stats = &report.stats;

    println!("=== Crawl Report ===\n");

    println!("Run:");
    println!("  Endpoint: {}", report.endpoint);
    println!("  Configurations scanned: {}", stats.configs_scanned);
    println!("  Pages scanned: {}", stats.pages_scanned);
    println!("  API calls: {}", stats.api_calls);
    println!("  Probes: {}", stats.probes);
    println!("  Rate limited: {}", stats.rate_limited);
    println!("  Errors: {}", stats.errors);
    println!();

    if stats.pages_by_endpoint.len() > 1 {
        println!("Pages by endpoint:");
        for (endpoint, pages) in &stats.pages_by_endpoint {
            println!("  {}: {}", endpoint, pages);
        }
        println!();
    }

    if report.new_records.is_empty() {
        println!("No new emotes found");
    } else {
        println!("Found {} new emotes:", report.new_records.len());
        for record in report.new_records.iter().take(MAX_LISTED) {
            println!("  + {} (ID: {})", record.name, record.id);
        }
        if report.new_records.len() > MAX_LISTED {
            println!("  ... and {} more", report.new_records.len() - MAX_LISTED);
        }
    }
    println!();

    println!(
        "Total emotes saved: {} (was {})",
        report.snapshot.total_items, report.prior_total
    );
}

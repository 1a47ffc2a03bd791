// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markdown_content(size: usize) -> String {
    let mut content = String::new();
    for section in 0..size {
        content.push_str(&format!("## Section {section}\n\n"));
        content.push_str(&format!(
            "Paragraph {section} talks about margins, notes and the passages they annotate.\n\
             Every section repeats some words so that quotes are ambiguous.\n\n"
        ));
        content.push_str("- First point\n- Second point\n  - Nested point\n\n");
        content.push_str("```rust\nfn example() {}\n```\n\n");
    }
    content
}

/// Replace every `stride`th occurrence of "margins" so exact matching fails there.
#[allow(dead_code)]
pub fn perturb(content: &str, stride: usize) -> String {
    content
        .split("margins")
        .enumerate()
        .map(|(i, part)| {
            if i == 0 {
                part.to_string()
            } else if i % stride == 0 {
                format!("margin{part}")
            } else {
                format!("margins{part}")
            }
        })
        .collect()
}

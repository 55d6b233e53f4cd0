//! Kernel cpulist format (`0-3,5,7-8`).

use std::collections::BTreeSet;

use autosmp_core::CoreId;

/// Highest core id accepted from a cpulist. Matches the kernel's largest
/// `NR_CPUS` configuration.
pub const MAX_CORE_ID: CoreId = 8191;

fn parse_core(raw: &str) -> Option<CoreId> {
    let core: CoreId = raw.parse().ok()?;
    (core <= MAX_CORE_ID).then_some(core)
}

/// Parse a cpulist. Returns `None` on any malformed element or on ids
/// above `MAX_CORE_ID`.
pub fn parse_cpu_list(list: &str) -> Option<BTreeSet<CoreId>> {
    let mut cores = BTreeSet::new();
    let list = list.trim();
    if list.is_empty() {
        return Some(cores);
    }
    for part in list.split(',') {
        let part = part.trim();
        match part.split_once('-') {
            Some((start, end)) => {
                let start = parse_core(start)?;
                let end = parse_core(end)?;
                if start > end {
                    return None;
                }
                cores.extend(start..=end);
            }
            None => {
                cores.insert(parse_core(part)?);
            }
        }
    }
    Some(cores)
}

/// Render a core set in cpulist form, collapsing consecutive runs.
pub fn format_cpu_list(cores: &BTreeSet<CoreId>) -> String {
    let mut parts = Vec::new();
    let mut iter = cores.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(next) = end.checked_add(1) {
            if iter.peek() != Some(&next) {
                break;
            }
            end = next;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{start}-{end}"));
        }
    }
    parts.join(",")
}

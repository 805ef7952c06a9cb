//! Predicate evaluation for `SearchLaptop`.

use catalog_tonic_core::proto::{Filter, Laptop, Memory};

/// Returns true iff the laptop satisfies every clause of the filter.
///
/// All four clauses are conjunctive: price at or below the maximum, core
/// count and minimum clock speed at or above their minimums, and memory at
/// or above the minimum after normalizing both operands to a common base.
/// Absent sub-messages evaluate as zero values, matching protobuf getter
/// semantics.
pub fn is_qualified(filter: &Filter, laptop: &Laptop) -> bool {
    if laptop.price_usd > filter.max_price_usd {
        return false;
    }

    let cores = laptop.cpu.as_ref().map_or(0, |cpu| cpu.number_of_cores);
    if cores < filter.min_cpu_cores {
        return false;
    }

    let min_ghz = laptop.cpu.as_ref().map_or(0.0, |cpu| cpu.min_ghz);
    if min_ghz < filter.min_cpu_ghz {
        return false;
    }

    let ram = laptop.ram.as_ref().map_or(0, Memory::normalized);
    let min_ram = filter.min_ram.as_ref().map_or(0, Memory::normalized);
    ram >= min_ram
}

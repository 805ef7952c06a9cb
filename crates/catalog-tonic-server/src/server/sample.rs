//! Random sample records, used to seed the store and to drive tests.

use crate::server::store::{StoreError, laptop::LaptopStore};
use catalog_tonic_core::proto::{
    Cpu, Gpu, Keyboard, Laptop, Memory, Screen, Storage, keyboard, laptop, memory, screen, storage,
};
use rand::Rng;
use std::time::SystemTime;
use uuid::Uuid;

fn pick<'a>(set: &[&'a str]) -> &'a str {
    set[rand::rng().random_range(0..set.len())]
}

pub fn new_keyboard() -> Keyboard {
    let mut rng = rand::rng();
    let layout = match rng.random_range(0..3) {
        0 => keyboard::Layout::Qwerty,
        1 => keyboard::Layout::Qwertz,
        _ => keyboard::Layout::Azerty,
    };

    Keyboard {
        layout: layout as i32,
        backlit: rng.random_bool(0.5),
    }
}

pub fn new_cpu() -> Cpu {
    let mut rng = rand::rng();
    let brand = pick(&["Intel", "AMD"]);
    let name = if brand == "Intel" {
        pick(&["Core i3", "Core i5", "Core i7", "Core i9"])
    } else {
        pick(&["Ryzen 5 PRO 3500U", "Ryzen 7 PRO 2700U"])
    };

    let number_of_cores = rng.random_range(2..=8);
    let number_of_threads = rng.random_range(number_of_cores..=12);
    let min_ghz = rng.random_range(1.0..3.6);
    let max_ghz = rng.random_range(min_ghz..5.0);

    Cpu {
        brand: brand.to_string(),
        name: name.to_string(),
        number_of_cores,
        number_of_threads,
        min_ghz,
        max_ghz,
    }
}

pub fn new_gpu() -> Gpu {
    let mut rng = rand::rng();
    let brand = pick(&["NVIDIA", "AMD"]);
    let name = if brand == "NVIDIA" {
        pick(&["RTX 2060", "RTX 2070", "GTX 1660-Ti"])
    } else {
        pick(&["RX 580", "RX 590"])
    };

    let min_ghz = rng.random_range(1.0..1.6);
    let max_ghz = rng.random_range(min_ghz..3.0);

    Gpu {
        brand: brand.to_string(),
        name: name.to_string(),
        min_ghz,
        max_ghz,
        memory: Some(Memory {
            value: rng.random_range(2..=6),
            unit: memory::Unit::Gigabyte as i32,
        }),
    }
}

pub fn new_ram() -> Memory {
    Memory {
        value: rand::rng().random_range(4..=64),
        unit: memory::Unit::Gigabyte as i32,
    }
}

pub fn new_ssd() -> Storage {
    Storage {
        driver: storage::Driver::Ssd as i32,
        memory: Some(Memory {
            value: rand::rng().random_range(128..=1024),
            unit: memory::Unit::Gigabyte as i32,
        }),
    }
}

pub fn new_hdd() -> Storage {
    Storage {
        driver: storage::Driver::Hdd as i32,
        memory: Some(Memory {
            value: rand::rng().random_range(1..=6),
            unit: memory::Unit::Terabyte as i32,
        }),
    }
}

pub fn new_screen() -> Screen {
    let mut rng = rand::rng();
    let height = rng.random_range(1080..=4320);
    let panel = if rng.random_bool(0.5) {
        screen::Panel::Ips
    } else {
        screen::Panel::Oled
    };

    Screen {
        size_inch: rng.random_range(13.0..17.0),
        resolution: Some(screen::Resolution {
            width: height * 16 / 9,
            height,
        }),
        panel: panel as i32,
        multitouch: rng.random_bool(0.5),
    }
}

pub fn new_laptop() -> Laptop {
    let mut rng = rand::rng();
    let brand = pick(&["Apple", "Dell", "Lenovo"]);
    let name = match brand {
        "Apple" => pick(&["Macbook Air", "Macbook Pro"]),
        "Dell" => pick(&["Latitude", "Vostro", "XPS", "Alienware"]),
        _ => pick(&["Thinkpad X1", "Thinkpad P1", "Thinkpad P53"]),
    };

    Laptop {
        id: Uuid::new_v4().to_string(),
        brand: brand.to_string(),
        name: name.to_string(),
        cpu: Some(new_cpu()),
        ram: Some(new_ram()),
        gpus: vec![new_gpu()],
        storages: vec![new_ssd(), new_hdd()],
        screen: Some(new_screen()),
        keyboard: Some(new_keyboard()),
        weight: Some(laptop::Weight::WeightKg(rng.random_range(1.0..3.0))),
        price_usd: rng.random_range(1500.0..3500.0),
        release_year: rng.random_range(2015..=2019),
        updated_at: Some(prost_types::Timestamp::from(SystemTime::now())),
    }
}

/// Registers `count` random laptops with the store.
pub async fn seed(store: &dyn LaptopStore, count: usize) -> Result<(), StoreError> {
    for _ in 0..count {
        let laptop = new_laptop();
        tracing::debug!(id = %laptop.id, "seeding sample laptop");
        store.save(&laptop).await?;
    }

    tracing::info!(count, "seeded sample laptops");
    Ok(())
}

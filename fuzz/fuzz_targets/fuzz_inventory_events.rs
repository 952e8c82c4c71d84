#![no_main]

use arbitrary::Arbitrary;
use gridstash::{
    CellPos, DefinitionCatalog, DefinitionKey, Inventory, InventoryConfig, InventoryEvent,
    ItemDefinition, ItemId,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Event {
    AutoPlace(u8),
    Remove(u8),
    Begin(u8),
    Hover { x: u8, y: u8, toggle: bool },
    Confirm { x: u8, y: u8 },
    Cancel,
    Resize { width: u8, height: u8 },
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    width: u8,
    height: u8,
    auto_rotate: bool,
    sizes: Vec<(u8, u8, bool)>,
    events: Vec<Event>,
}

fuzz_target!(|input: Input| {
    // Arena 1..=16 per side, up to 8 definitions of 1..=6 per side.
    let config = InventoryConfig {
        width: u16::from(input.width % 16) + 1,
        height: u16::from(input.height % 16) + 1,
        auto_rotate: input.auto_rotate,
    };
    let definitions = input.sizes.iter().take(8).enumerate().map(|(i, &(w, h, rotate))| {
        let def = ItemDefinition::new(format!("d{i}"), u16::from(w % 6) + 1, u16::from(h % 6) + 1);
        if rotate { def } else { def.without_rotation() }
    });
    let Ok(catalog) = DefinitionCatalog::from_definitions(definitions) else {
        return;
    };
    let keys = catalog.len().max(1);
    let Ok(mut inv) = Inventory::new(&config, catalog) else {
        return;
    };

    for event in input.events.into_iter().take(256) {
        let id = |n: u8| ItemId::new(u64::from(n) + 1).ok();
        let event = match event {
            Event::AutoPlace(k) => InventoryEvent::RequestAutoPlace {
                key: DefinitionKey::new(format!("d{}", usize::from(k) % keys)),
            },
            Event::Remove(n) => match id(n) {
                Some(item) => InventoryEvent::RequestRemove { item },
                None => continue,
            },
            Event::Begin(n) => match id(n) {
                Some(item) => InventoryEvent::BeginMove { item },
                None => continue,
            },
            Event::Hover { x, y, toggle } => InventoryEvent::Hover {
                origin: CellPos::new(u16::from(x % 20), u16::from(y % 20)),
                toggle_rotation: toggle,
            },
            Event::Confirm { x, y } => InventoryEvent::Confirm {
                origin: CellPos::new(u16::from(x % 20), u16::from(y % 20)),
            },
            Event::Cancel => InventoryEvent::Cancel,
            Event::Resize { width, height } => {
                let _ = inv.resize(u16::from(width % 20), u16::from(height % 20));
                continue;
            }
            Event::Clear => {
                let _ = inv.clear();
                continue;
            }
        };
        let _ = inv.handle(event);

        let report = inv.invariant_report();
        assert!(report.is_clean(), "invariants broken: {:?}", report.issues);
        assert!(inv.items().filter(|r| !r.is_placed()).count() <= 1);
    }

    // Teardown must never leave an item floating.
    let _ = inv.clear();
    assert!(inv.is_empty());
    assert_eq!(inv.grid().occupied_cells(), 0);
});

#![no_main]

use gridstash::{CellPos, Footprint, ItemId, OccupancyGrid, Orientation, first_fit};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First two bytes pick the arena (1..=24 x 1..=24); the rest are 4-byte ops.
    if data.len() < 2 {
        return;
    }
    let width = u16::from(data[0] % 24) + 1;
    let height = u16::from(data[1] % 24) + 1;
    let Ok(mut grid) = OccupancyGrid::new(width, height) else {
        return;
    };
    let mut next_id = 1u64;

    for op in data[2..].chunks_exact(4) {
        let Ok(footprint) = Footprint::new(u16::from(op[1] % 8) + 1, u16::from(op[2] % 8) + 1)
        else {
            return;
        };
        match op[0] % 3 {
            0 => {
                let Ok(id) = ItemId::new(next_id) else { return };
                let origin = CellPos::new(u16::from(op[3] % 32), u16::from(op[3] / 8));
                let expected = grid.can_place(origin, footprint);
                let before = grid.clone();
                let placed = grid.place(id, origin, footprint);
                assert_eq!(placed, expected);
                if placed {
                    assert_eq!(grid.cells_of(id).len() as u32, footprint.area());
                    next_id += 1;
                } else {
                    assert_eq!(grid, before, "failed place mutated the grid");
                }
            }
            1 => {
                if let Some(slot) = first_fit(&grid, footprint, op[3] & 1 == 0) {
                    let held = slot.footprint(footprint);
                    assert!(grid.can_place(slot.origin, held));
                    if op[3] & 1 != 0 {
                        assert_eq!(slot.orientation, Orientation::Normal);
                    }
                }
            }
            _ => {
                if next_id > 1 {
                    let target = u64::from(op[3]) % (next_id - 1) + 1;
                    if let Ok(id) = ItemId::new(target) {
                        grid.remove(id);
                        assert!(grid.cells_of(id).is_empty());
                    }
                }
            }
        }
        assert_eq!(
            grid.occupied_cells() + grid.free_cells(),
            usize::from(width) * usize::from(height)
        );
    }
});

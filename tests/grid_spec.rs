use std::io::Cursor;

use resdata_reader::resdata::MAIN_GRID_ID;
use resdata_reader::{
    ActiveIndexMap, Endian, FaultBlockLayer, Grid, GridDims, Keyword, KwData, RecordStream,
    ResdataError,
};

fn memory_stream() -> RecordStream<Cursor<Vec<u8>>> {
    RecordStream::from_stream(Cursor::new(Vec::new()), Endian::Big)
}

/// Alternating mask on (5, 4, 2): odd global cells active.
fn alternating_mask(size: u32) -> Vec<bool> {
    (0..size).map(|g| g % 2 == 1).collect()
}

#[test]
fn alternating_mask_index_bijection() {
    let dims = GridDims::new(5, 4, 2);
    let mask = alternating_mask(dims.global_size());
    let grid = Grid::new(dims, Some(&mask)).expect("grid");

    assert_eq!(grid.nactive(), 20);
    assert_eq!(grid.active_to_global(0).expect("first active"), 1);
    assert_eq!(grid.global_to_active(0).expect("inactive cell"), None);
    assert_eq!(grid.global_to_active(1).expect("active cell"), Some(0));

    for active in 0..grid.nactive() {
        let global = grid.active_to_global(active).expect("round trip");
        assert_eq!(grid.global_to_active(global).expect("round trip"), Some(active));
    }

    // Out of range is an error in both directions, never None.
    assert!(matches!(
        grid.global_to_active(dims.global_size()),
        Err(ResdataError::OutOfRange { .. })
    ));
    assert!(matches!(
        grid.active_to_global(grid.nactive()),
        Err(ResdataError::OutOfRange { .. })
    ));
}

#[test]
fn ijk_conversions_are_inverse_and_bounded() {
    let dims = GridDims::new(10, 10, 10);
    assert_eq!(dims.ijk_to_global(9, 9, 9).expect("corner"), 999);
    assert_eq!(dims.ijk_to_global(1, 2, 3).expect("cell"), 1 + 20 + 300);
    assert_eq!(dims.global_to_ijk(321).expect("cell"), (1, 2, 3));
    for global in [0, 1, 99, 100, 999] {
        let (i, j, k) = dims.global_to_ijk(global).expect("split");
        assert_eq!(dims.ijk_to_global(i, j, k).expect("join"), global);
    }
    assert!(matches!(
        dims.ijk_to_global(10, 0, 0),
        Err(ResdataError::OutOfRange { .. })
    ));
    assert!(matches!(
        dims.global_to_ijk(1000),
        Err(ResdataError::OutOfRange { .. })
    ));
}

#[test]
fn reset_actnum_matches_fresh_build() {
    let dims = GridDims::new(5, 4, 2);
    let mask = alternating_mask(dims.global_size());

    let mut map = ActiveIndexMap::build(dims.global_size(), None).expect("build");
    assert_eq!(map.nactive(), dims.global_size());

    map.reset_actnum(Some(&mask)).expect("reset");
    let fresh = ActiveIndexMap::build(dims.global_size(), Some(&mask)).expect("build");
    assert_eq!(map, fresh);

    map.reset_actnum(None).expect("reset to all-active");
    assert_eq!(map.nactive(), dims.global_size());
    assert_eq!(map.actnum(), vec![true; dims.global_size() as usize]);
}

#[test]
fn lgr_maps_local_cells_to_host_cells() {
    let mut grid = Grid::new(GridDims::new(10, 10, 10), None).expect("grid");
    let mut map = vec![998u32; 9];
    map[0] = 999;
    let id = grid
        .add_lgr("global", "TROLLA", GridDims::new(3, 3, 1), map, None)
        .expect("add LGR");
    assert_eq!(id, 1);

    let trolla = grid.get_lgr("TROLLA").expect("child lookup");
    assert_eq!(trolla.lgr_id(), 1);
    assert_eq!(trolla.dims(), GridDims::new(3, 3, 1));
    assert_eq!(trolla.parent_cell_of(0).expect("host"), 999);
    assert_eq!(trolla.parent_cell_of(8).expect("host"), 998);
    assert!(matches!(
        trolla.parent_cell_of(9),
        Err(ResdataError::OutOfRange { .. })
    ));

    // The root has no parent cells.
    assert!(matches!(
        grid.main_grid().parent_cell_of(0),
        Err(ResdataError::OutOfRange { .. })
    ));

    // Sibling name collision.
    match grid.add_lgr("global", "TROLLA", GridDims::new(2, 2, 1), vec![0; 4], None) {
        Err(ResdataError::DuplicateName(name)) => assert_eq!(name, "TROLLA"),
        other => panic!("expected DuplicateName, got {:?}", other),
    }

    // Mapping pointing outside the parent.
    match grid.add_lgr("global", "TROLLB", GridDims::new(2, 2, 1), vec![0, 1, 2, 1000], None) {
        Err(ResdataError::InvalidMapping { lgr, index, parent_size }) => {
            assert_eq!(lgr, "TROLLB");
            assert_eq!(index, 1000);
            assert_eq!(parent_size, 1000);
        }
        other => panic!("expected InvalidMapping, got {:?}", other),
    }
    assert!(grid.get_lgr("TROLLB").is_none(), "rejected LGR not inserted");
}

#[test]
fn nested_lgr_lookup() {
    let mut grid = Grid::new(GridDims::new(4, 4, 1), None).expect("grid");
    grid.add_lgr("global", "WELL1", GridDims::new(2, 2, 1), vec![0, 1, 4, 5], None)
        .expect("first level");
    grid.add_lgr("WELL1", "WELL1A", GridDims::new(1, 1, 1), vec![3], None)
        .expect("second level");

    // get_lgr is one level only; find_lgr walks the tree.
    assert!(grid.get_lgr("WELL1A").is_none());
    let nested = grid.find_lgr("WELL1A").expect("deep lookup");
    assert_eq!(nested.lgr_id(), 2);
    assert_eq!(nested.parent_cell_of(0).expect("host"), 3);
    assert_eq!(grid.lgr_by_id(2).expect("by id").name(), "WELL1A");
    assert_eq!(grid.find_lgr("global").expect("root").lgr_id(), MAIN_GRID_ID);
    assert_eq!(grid.main_grid().descendants().len(), 3);
}

#[test]
fn nnc_vectors_record_direction_and_absence() {
    let mut grid = Grid::new(GridDims::new(3, 3, 1), None).expect("grid");
    grid.add_lgr("global", "WELL1", GridDims::new(2, 2, 1), vec![0, 1, 3, 4], None)
        .expect("lgr");

    grid.add_self_nnc(MAIN_GRID_ID, 5, 0, 0).expect("self nnc");
    grid.add_self_nnc(MAIN_GRID_ID, 6, 1, 1).expect("self nnc");

    {
        let info = grid.nnc_info(MAIN_GRID_ID).expect("main grid info");
        let own = info.get_vector(MAIN_GRID_ID).expect("self vector");
        assert_eq!(own.len(), 2);
        assert_eq!(own.grid_index_list(), &[0, 1]);
        assert_eq!(own.nnc_index_list(), &[0, 1]);
        assert!(info.get_vector(1).is_none(), "no main-to-LGR data yet");
    }

    grid.add_main_lgr_nnc(1, 4, 2, 2).expect("main-lgr nnc");
    let info = grid.nnc_info(MAIN_GRID_ID).expect("main grid info");
    let toward_lgr = info.get_vector(1).expect("vector to LGR");
    assert_eq!(toward_lgr.grid_index_list(), &[2]);
    assert_eq!(toward_lgr.nnc_index_list(), &[2]);
    assert_eq!(info.self_vector().map(|v| v.len()), Some(2));
    assert_eq!(grid.total_nnc_count(), 3);

    // LGR 1 owns nothing: all three connections head from the main grid.
    assert!(grid.nnc_info(1).is_none());

    // Cells outside the grids are rejected.
    assert!(matches!(
        grid.add_self_nnc(MAIN_GRID_ID, 9, 0, 3),
        Err(ResdataError::OutOfRange { .. })
    ));
    assert!(matches!(
        grid.add_main_lgr_nnc(1, 0, 4, 3),
        Err(ResdataError::OutOfRange { .. })
    ));
    assert!(matches!(
        grid.add_main_lgr_nnc(MAIN_GRID_ID, 0, 0, 3),
        Err(ResdataError::InvalidFormat(_))
    ));
}

fn build_full_grid() -> Grid {
    let dims = GridDims::new(4, 3, 2);
    let mask: Vec<bool> = (0..dims.global_size()).map(|g| g % 3 != 0).collect();
    let mut grid = Grid::new(dims, Some(&mask)).expect("grid");
    grid.add_lgr("global", "WELL1", GridDims::new(2, 2, 1), vec![0, 1, 4, 5], None)
        .expect("lgr");
    grid.add_lgr("WELL1", "WELL1A", GridDims::new(1, 1, 1), vec![2], None)
        .expect("nested lgr");
    grid.add_self_nnc(MAIN_GRID_ID, 3, 7, 0).expect("nnc");
    grid.add_self_nnc(MAIN_GRID_ID, 7, 11, 1).expect("nnc");
    grid.add_main_lgr_nnc(1, 5, 0, 2).expect("nnc");
    let labels: Vec<i32> = (0..dims.global_size() as i32).map(|g| g % 4).collect();
    grid.set_fault_blocks(labels).expect("fault blocks");
    grid
}

fn assert_same_grid(loaded: &Grid, original: &Grid) {
    assert_eq!(loaded.dims(), original.dims());
    assert_eq!(loaded.nactive(), original.nactive());
    assert_eq!(
        loaded.main_grid().active_index(),
        original.main_grid().active_index()
    );

    for node in original.main_grid().descendants().into_iter().skip(1) {
        let found = loaded.find_lgr(node.name()).expect("LGR survived");
        assert_eq!(found.lgr_id(), node.lgr_id());
        assert_eq!(found.dims(), node.dims());
        for local in 0..node.dims().global_size() {
            assert_eq!(
                found.parent_cell_of(local).expect("host"),
                node.parent_cell_of(local).expect("host")
            );
        }
    }

    assert_eq!(loaded.total_nnc_count(), original.total_nnc_count());
    assert_eq!(
        loaded.nnc_info(MAIN_GRID_ID),
        original.nnc_info(MAIN_GRID_ID)
    );
}

#[test]
fn write_then_load_round_trip_binary() {
    let original = build_full_grid();
    let mut stream = memory_stream();
    original.write_stream(&mut stream).expect("write");
    stream.rewind().expect("rewind");
    let loaded = Grid::from_stream(&mut stream).expect("load");

    assert_same_grid(&loaded, &original);
    let layer = loaded.fault_block_layer(1).expect("layer");
    assert_eq!(layer.value_sum(), original.fault_block_layer(1).expect("layer").value_sum());
}

#[test]
fn write_then_load_round_trip_formatted() {
    let original = build_full_grid();
    let mut stream = RecordStream::from_formatted(Cursor::new(Vec::new()));
    original.write_stream(&mut stream).expect("write formatted");
    stream.rewind().expect("rewind");
    let loaded = Grid::from_stream(&mut stream).expect("load formatted");
    assert_same_grid(&loaded, &original);
}

#[test]
fn trannnc_length_must_match_connection_count() {
    let grid = build_full_grid();
    assert_eq!(grid.total_nnc_count(), 3);

    // Matching table: accepted.
    let mut stream = memory_stream();
    grid.write_stream(&mut stream).expect("write");
    Keyword::new("TRANNNC", KwData::Float(vec![0.1, 0.2, 0.3]))
        .expect("kw")
        .write(&mut stream)
        .expect("append table");
    stream.rewind().expect("rewind");
    Grid::from_stream(&mut stream).expect("load with matching TRANNNC");

    // One entry too many: rejected.
    let mut stream = memory_stream();
    grid.write_stream(&mut stream).expect("write");
    Keyword::new("TRANNNC", KwData::Float(vec![0.1, 0.2, 0.3, 0.4]))
        .expect("kw")
        .write(&mut stream)
        .expect("append table");
    stream.rewind().expect("rewind");
    match Grid::from_stream(&mut stream) {
        Err(ResdataError::Consistency { expected, found, .. }) => {
            assert_eq!(expected, 3);
            assert_eq!(found, 4);
        }
        other => panic!("expected Consistency error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn dimension_product_overflow_is_an_error() {
    // 70000 * 70000 * 1 does not fit the u32 cell index space; the load
    // must fail with a typed error, not wrap or panic.
    let mut stream = memory_stream();
    Keyword::new("DIMENS", KwData::Int(vec![70_000, 70_000, 1]))
        .expect("kw")
        .write(&mut stream)
        .expect("write");
    stream.rewind().expect("rewind");
    assert!(matches!(
        Grid::from_stream(&mut stream),
        Err(ResdataError::InvalidFormat(_))
    ));

    // The builder path rejects the same product.
    assert!(matches!(
        Grid::new(GridDims::new(70_000, 70_000, 1), None),
        Err(ResdataError::OutOfRange { .. })
    ));
    assert!(matches!(
        GridDims::new(70_000, 70_000, 1).checked_global_size(),
        Err(ResdataError::OutOfRange { .. })
    ));
}

#[test]
fn load_requires_leading_dimens() {
    let mut stream = memory_stream();
    Keyword::new("ACTNUM", KwData::Int(vec![1, 1, 1, 1]))
        .expect("kw")
        .write(&mut stream)
        .expect("write");
    stream.rewind().expect("rewind");
    assert!(matches!(
        Grid::from_stream(&mut stream),
        Err(ResdataError::MissingKeyword("DIMENS"))
    ));
}

#[test]
fn loader_skips_unrelated_keywords() {
    let mut stream = memory_stream();
    let grid = Grid::new(GridDims::new(2, 2, 1), None).expect("grid");
    grid.write_stream(&mut stream).expect("write");
    Keyword::new("PORO", KwData::Float(vec![0.25; 4]))
        .expect("kw")
        .write(&mut stream)
        .expect("append property");
    stream.rewind().expect("rewind");
    let loaded = Grid::from_stream(&mut stream).expect("load");
    assert_eq!(loaded.dims(), GridDims::new(2, 2, 1));
}

/// 3x3 layer with block 7 on the L-shaped cells (0,0), (1,0), (0,1).
fn l_shaped_layer() -> FaultBlockLayer {
    let values = vec![
        7, 7, 0, //
        7, 0, 0, //
        0, 0, 0, //
    ];
    FaultBlockLayer::scan(0, 3, 3, &values).expect("layer")
}

#[test]
fn fault_block_flood_fill_from_any_member() {
    let layer = l_shaped_layer();
    assert_eq!(layer.block_value(0, 0).expect("value"), 7);
    assert_eq!(layer.block_value(2, 2).expect("value"), 0);
    assert_eq!(layer.value_sum(), 21);

    for (i, j) in [(0u32, 0u32), (1, 0), (0, 1)] {
        let (i_list, j_list) = layer.trace_block_content(i, j, 7).expect("fill");
        assert_eq!(i_list.len(), 3, "fill from ({}, {})", i, j);
        let mut cells: Vec<(i32, i32)> =
            i_list.into_iter().zip(j_list).collect();
        cells.sort_unstable();
        assert_eq!(cells, [(0, 0), (0, 1), (1, 0)]);
    }

    // Starting from a cell that does not carry the id.
    match layer.trace_block_content(2, 2, 7) {
        Err(ResdataError::NoSuchBlock { i, j, block_id }) => {
            assert_eq!((i, j, block_id), (2, 2, 7));
        }
        other => panic!("expected NoSuchBlock, got {:?}", other),
    }
}

#[test]
fn fault_block_edge_trace_outlines_the_component() {
    let layer = l_shaped_layer();
    let (corners, cells) = layer.trace_block_edge(1, 0, 7).expect("trace");

    // Counter-clockwise outline of the L, starting at the origin corner.
    assert_eq!(
        corners,
        [
            (0, 0),
            (1, 0),
            (2, 0),
            (2, 1),
            (1, 1),
            (1, 2),
            (0, 2),
            (0, 1),
        ]
    );

    let mut sorted = cells.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, [0, 1, 3], "every member cell appears on the boundary");
}

#[test]
fn fault_block_neighbours_are_distinct_and_sorted() {
    let values = vec![
        7, 7, 3, //
        7, 5, 3, //
        5, 5, 0, //
    ];
    let layer = FaultBlockLayer::scan(0, 3, 3, &values).expect("layer");
    assert_eq!(layer.block_neighbours(7), [3, 5]);
    assert_eq!(layer.block_neighbours(5), [3, 7]);
    assert_eq!(layer.block_neighbours(3), [5, 7]);
}

#[test]
fn fault_block_layer_slices_the_requested_k() {
    let dims = GridDims::new(3, 3, 2);
    let mut grid = Grid::new(dims, None).expect("grid");
    let mut labels = vec![1i32; 9];
    labels.extend(vec![2i32; 9]);
    grid.set_fault_blocks(labels).expect("labels");

    assert_eq!(grid.fault_block_layer(0).expect("k=0").block_value(1, 1).expect("value"), 1);
    assert_eq!(grid.fault_block_layer(1).expect("k=1").block_value(1, 1).expect("value"), 2);
    assert!(matches!(
        grid.fault_block_layer(2),
        Err(ResdataError::OutOfRange { .. })
    ));

    // No labels loaded at all.
    let bare = Grid::new(dims, None).expect("grid");
    assert!(matches!(
        bare.fault_block_layer(0),
        Err(ResdataError::MissingKeyword("FAULTBLK"))
    ));
}

use token_tracker::engine::{
    prelude::*,
    snapshot::{self, MemoryStore},
};

fn soldier() -> TokenTemplate {
    TokenTemplate::new("1/1 Soldier")
        .with_stats(1, 1)
        .with_colors([Color::White])
}

fn zombie() -> TokenTemplate {
    TokenTemplate::new("2/2 Zombie")
        .with_stats(2, 2)
        .with_colors([Color::Black])
}

fn group_counts(board: &Board, settings: &Settings) -> Vec<usize> {
    let mut counts: Vec<usize> = board.groups(settings).iter().map(|g| g.count()).collect();
    counts.sort_unstable();
    counts
}

#[test]
fn five_soldiers_stack_then_split_when_two_tap() {
    let mut board = Board::new();
    let settings = Settings::default();
    let ids = board.add_token(&soldier(), 5);

    let groups = board.groups(&settings);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count(), 5);

    board.toggle_tap(ids[0]);
    board.toggle_tap(ids[1]);

    let groups = board.groups(&settings);
    assert_eq!(groups.len(), 2);
    let tapped = groups.iter().find(|g| g.representative().tapped).unwrap();
    let untapped = groups.iter().find(|g| !g.representative().tapped).unwrap();
    assert_eq!(tapped.count(), 2);
    assert_eq!(untapped.count(), 3);
}

#[test]
fn grouping_never_loses_or_duplicates_tokens() {
    let mut board = Board::new();
    let ids = board.add_token(&soldier(), 4);
    board.add_token(&zombie(), 1);
    board.add_token(&TokenTemplate::new("Treasure"), 2);
    board.toggle_tap(ids[3]);
    board.add_plus_counter(ids[2]);

    for k in 1..=6 {
        let mut seen: Vec<TokenID> = group(board.battlefield(), k)
            .iter()
            .flat_map(|g| g.ids())
            .collect();
        seen.sort();
        let mut expected: Vec<TokenID> = board.battlefield().iter().map(|t| t.id).collect();
        expected.sort();
        assert_eq!(seen, expected, "threshold {k}");
    }
}

#[test]
fn threshold_boundary_decides_stacking() {
    let mut board = Board::new();
    board.add_token(&soldier(), 3);

    let mut settings = Settings::default();
    settings.set_min_stack_size(3);
    assert_eq!(group_counts(&board, &settings), vec![3]);

    settings.set_min_stack_size(4);
    assert_eq!(group_counts(&board, &settings), vec![1, 1, 1]);
}

#[test]
fn disabling_auto_stack_shows_every_token() {
    let mut board = Board::new();
    board.add_token(&soldier(), 3);
    let mut settings = Settings::default();
    settings.auto_stack_enabled = false;
    assert_eq!(group_counts(&board, &settings), vec![1, 1, 1]);
}

#[test]
fn destroying_a_missing_token_changes_nothing() {
    let mut board = Board::new();
    let ids = board.add_token(&soldier(), 2);
    board.move_to_graveyard(ids[0]);

    let battlefield = board.battlefield().to_vec();
    let graveyard = board.graveyard().to_vec();

    // already in the graveyard, so not on the battlefield
    assert!(!board.move_to_graveyard(ids[0]));
    assert!(!board.move_to_graveyard(TokenID::from_raw(999)));
    assert_eq!(board.battlefield(), battlefield.as_slice());
    assert_eq!(board.graveyard(), graveyard.as_slice());
}

#[test]
fn restore_gives_a_new_sick_token_with_the_same_face() {
    let mut board = Board::new();
    let hasty = zombie().with_abilities("Haste").with_haste();
    let id = board.add_token(&hasty, 1)[0];
    board.move_to_graveyard(id);
    let dead = board.graveyard()[0].clone();

    let restored_id = board.restore_from_graveyard(id).unwrap();
    assert_ne!(restored_id, id);
    assert!(board.graveyard().is_empty());

    let restored = board.get(restored_id).unwrap();
    assert!(restored.summoning_sickness);
    assert_eq!(restored.name, dead.name);
    assert_eq!(restored.stats, dead.stats);
    assert_eq!(restored.colors, dead.colors);
    assert_eq!(restored.abilities, dead.abilities);
}

#[test]
fn cleanup_takes_only_creatures_out_of_toughness() {
    let mut board = Board::new();
    let ids = board.add_token(&zombie(), 2);
    let treasure = board.add_token(&TokenTemplate::new("Treasure"), 1)[0];

    board.add_minus_counter(ids[0]);
    board.add_minus_counter(ids[0]);
    board.add_minus_counter(ids[1]);
    board.add_minus_counter(treasure);

    assert_eq!(board.get(ids[0]).unwrap().current_stats().unwrap().toughness, 0);
    assert_eq!(board.get(ids[1]).unwrap().current_stats().unwrap().toughness, 1);

    assert_eq!(board.cleanup(), vec![ids[0]]);
    assert_eq!(board.zone_of(ids[0]), Some(Zone::Graveyard));
    assert_eq!(board.zone_of(ids[1]), Some(Zone::Battlefield));
    assert_eq!(board.zone_of(treasure), Some(Zone::Battlefield));
    assert!(board.cleanup().is_empty());
}

#[test]
fn opposing_counters_cancel_on_the_token() {
    let mut board = Board::new();
    let id = board.add_token(&soldier(), 1)[0];
    for _ in 0..3 {
        board.add_minus_counter(id);
    }
    board.add_plus_counter(id);
    board.add_plus_counter(id);

    let token = board.get(id).unwrap();
    assert_eq!(token.typed_counters.plus_one, 0);
    assert_eq!(token.typed_counters.minus_one, 1);
    assert_eq!(token.typed_counters.net(), -1);
}

#[test]
fn named_counters_floor_at_zero() {
    let mut board = Board::new();
    let id = board.add_token(&TokenTemplate::new("Planeswalker"), 1)[0];

    board.set_custom_counter(id, "loyalty", 3);
    board.remove_custom_counter(id, "loyalty");
    assert_eq!(board.get(id).unwrap().counters.count("loyalty"), 2);

    board.set_custom_counter(id, "loyalty", 1);
    board.remove_custom_counter(id, "loyalty");
    assert!(board.get(id).unwrap().counters.get("loyalty").is_none());

    board.set_custom_counter(id, "loyalty", 4);
    board.set_custom_counter(id, "loyalty", 0);
    assert!(board.get(id).unwrap().counters.is_empty());
}

#[test]
fn splitting_a_stack_taps_the_first_members() {
    let mut board = Board::new();
    let settings = Settings::default();
    let ids = board.add_token(&soldier(), 5);

    let mut stack = ExpandedStack::expand(&board.groups(&settings)[0]);
    assert!(!board.split_stack(&mut stack, 5));
    assert!(board.split_stack(&mut stack, 2));
    assert!(stack.is_empty(&board));

    let tapped: Vec<bool> = ids.iter().map(|&id| board.get(id).unwrap().tapped).collect();
    assert_eq!(tapped, vec![true, true, false, false, false]);
    assert_eq!(group_counts(&board, &settings), vec![2, 3]);
}

#[test]
fn board_survives_a_save_and_reload() {
    let store = MemoryStore::new();
    let mut board = Board::new();
    let ids = board.add_token(&soldier(), 3);
    board.toggle_tap(ids[0]);
    board.add_plus_counter(ids[1]);
    board.toggle_select(ids[2]);
    board.move_to_graveyard(ids[0]);

    let mut settings = Settings::default();
    settings.set_min_stack_size(3);

    snapshot::save_board(&store, &board).unwrap();
    snapshot::save_settings(&store, &settings).unwrap();

    let mut reloaded = snapshot::load_board(&store).unwrap();
    assert_eq!(reloaded.battlefield(), board.battlefield());
    assert_eq!(reloaded.graveyard(), board.graveyard());
    assert!(reloaded.selected().contains(&ids[2]));
    assert_eq!(snapshot::load_settings(&store).unwrap(), settings);

    // ids keep counting up across sessions
    let fresh = reloaded.add_token(&soldier(), 1)[0];
    assert!(ids.iter().all(|&id| fresh > id));
}

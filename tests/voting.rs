//! Test the per-pixel disparity vote table

use cv_edge_disparity::voting::VoteTable;

#[test]
fn votes_sum_to_number_of_passes() {
    let passes: [[u8; 4]; 3] = [[0, 1, 2, 3], [3, 1, 0, 0], [3, 3, 3, 3]];

    let mut table = VoteTable::new(4, 3);
    for pass in passes.iter() {
        table.tally(pass);
    }

    assert_eq!(table.passes(), 3);
    for pixel in 0..4 {
        assert_eq!(table.votes(pixel).iter().sum::<u32>(), 3);
    }

    assert_eq!(table.votes(0), &[1, 0, 0, 2]);
    assert_eq!(table.finalize(), vec![3, 1, 0, 3]);
}

#[test]
fn ties_go_to_the_smallest_disparity() {
    let mut table = VoteTable::new(2, 4);
    table.tally(&[4, 2]);
    table.tally(&[1, 3]);

    assert_eq!(table.winner(0), 1);
    assert_eq!(table.winner(1), 2);
}

#[test]
fn empty_table_picks_zero() {
    let table = VoteTable::new(3, 5);

    assert_eq!(table.finalize(), vec![0, 0, 0]);
    assert_eq!(table.passes(), 0);
}

#[test]
fn merging_tables_adds_votes_and_passes() {
    let mut a = VoteTable::new(2, 2);
    a.tally(&[2, 0]);

    let mut b = VoteTable::new(2, 2);
    b.tally(&[2, 1]);
    b.tally(&[1, 1]);

    a.merge(&b);

    assert_eq!(a.passes(), 3);
    assert_eq!(a.votes(0), &[0, 1, 2]);
    assert_eq!(a.votes(1), &[1, 2, 0]);
    assert_eq!(a.finalize(), vec![2, 1]);
}

#[test]
#[should_panic]
fn tally_rejects_wrong_length() {
    let mut table = VoteTable::new(4, 2);
    table.tally(&[0, 1]);
}

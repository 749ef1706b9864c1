//! Checks of the NCBI dump iterators over taxdump-shaped fixtures.

use std::io::Write;
use std::path::PathBuf;

use caduceus_bio::ncbi::{DelnodesRecords, LineageRecords, MergedRecords, TaxonomyIterator};
use caduceus_core::error::CaduceusResult;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const NODES: &str = concat!(
    "9606\t|\t9605\t|\tspecies\t|\tHS\t|\t5\t|\t1\t|\t1\t|\t1\t|\t2\t|\t1\t|\t1\t|\t0\t|",
    "\tcode compliant; specified\t|\t\t|\t\t|\t1\t|\t0\t|\t1\t|\n",
    "9913\t|\t9903\t|\tspecies\t|\tBT\t|\t2\t|\t1\t|\t1\t|\t1\t|\t2\t|\t1\t|\t1\t|\t0\t|",
    "\tcode compliant; specified\t|\t\t|\t\t|\t1\t|\t0\t|\t1\t|\n",
    "131567\t|\t1\t|\tno rank\t|\t\t|\t8\t|\t1\t|\t1\t|\t1\t|\t0\t|\t1\t|\t1\t|\t0\t|",
    "\t\t|\t\t|\t\t|\t0\t|\t0\t|\t1\t|\n",
    "2759\t|\t131567\t|\tsuperkingdom\t|\t\t|\t1\t|\t0\t|\t1\t|\t0\t|\t1\t|\t0\t|\t0\t|\t0\t|",
    "\t\t|\t11\t|\t0\t|\t0\t|\t0\t|\t1\t|\n",
    "33154\t|\t2759\t|\tclade\t|\t\t|\t4\t|\t0\t|\t1\t|\t1\t|\t1\t|\t1\t|\t1\t|\t0\t|",
    "\t\t|\t\t|\t0\t|\t0\t|\t0\t|\t1\t|",
);

const NAMES: &str = concat!(
    "9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|\n",
    "9606\t|\thuman\t|\t\t|\tgenbank common name\t|\n",
    "9913\t|\tBos taurus\t|\t\t|\tscientific name\t|\n",
    "131567\t|\tcellular organisms\t|\t\t|\tscientific name\t|\n",
    "2759\t|\tEukaryota\t|\t\t|\tscientific name\t|\n",
    "33154\t|\tOpisthokonta\t|\t\t|\tscientific name\t|",
);

const LINEAGE: &str = "9606\t|\t131567 2759 33154 \t|\n9913\t|\t131567 2759 33154 \t|";

const MERGED: &str = "272461\t|\t9913\t|\n272470\t|\t192252\t|";

const DELNODES: &str = concat!(
    "3122894\t|\n",
    "3122893\t|\n",
    "3122892\t|\n",
    "3122891\t|\n",
    "3122890\t|",
);

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn taxonomy_walk_joins_names_and_nodes() {
    let dir = TempDir::new().unwrap();
    let names = write_file(&dir, "names.dmp", NAMES);
    let nodes = write_file(&dir, "nodes.dmp", NODES);

    let rows: Vec<_> = TaxonomyIterator::new(&names, &nodes)
        .records()
        .unwrap()
        .collect::<CaduceusResult<Vec<_>>>()
        .unwrap();

    let expected = [
        ("species", 9606, "Homo sapiens[9606]"),
        ("species", 9913, "Bos taurus[9913]"),
        ("no rank", 131567, "cellular organisms[131567]"),
        ("superkingdom", 2759, "Eukaryota[2759]"),
        ("clade", 33154, "Opisthokonta[33154]"),
    ];

    let actual: Vec<_> = rows
        .iter()
        .map(|row| (row.rank.as_str(), row.ncbi_id, row.tax_name.as_str()))
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn lineage_emits_self_pairs_and_ancestor_pairs() {
    let dir = TempDir::new().unwrap();
    let lineage = write_file(&dir, "taxidlineage.dmp", LINEAGE);

    let pairs: Vec<_> = LineageRecords::open(&lineage)
        .unwrap()
        .collect::<CaduceusResult<Vec<_>>>()
        .unwrap();

    let actual: Vec<_> = pairs
        .iter()
        .map(|pair| (pair.main_taxid, pair.parent_taxid))
        .collect();
    assert_eq!(
        actual,
        vec![
            (9606, 9606),
            (9606, 131567),
            (9606, 2759),
            (9606, 33154),
            (9913, 9913),
            (9913, 131567),
            (9913, 2759),
            (9913, 33154),
        ]
    );
}

#[test]
fn merged_and_delnodes_round_out_the_taxonomy() {
    let dir = TempDir::new().unwrap();
    let merged = write_file(&dir, "merged.dmp", MERGED);
    let delnodes = write_file(&dir, "delnodes.dmp", DELNODES);

    let merged_pairs: Vec<_> = MergedRecords::open(&merged)
        .unwrap()
        .collect::<CaduceusResult<Vec<_>>>()
        .unwrap();
    assert_eq!(merged_pairs.len(), 2);
    assert_eq!(merged_pairs[1].deprecated_id, 272470);
    assert_eq!(merged_pairs[1].current_id, 192252);

    let deleted: Vec<_> = DelnodesRecords::open(&delnodes)
        .unwrap()
        .collect::<CaduceusResult<Vec<_>>>()
        .unwrap();
    assert_eq!(deleted.len(), 5);
    assert!(deleted
        .iter()
        .all(|row| row.rank == "no rank" && row.tax_name == format!("deleted[{}]", row.ncbi_id)));
}

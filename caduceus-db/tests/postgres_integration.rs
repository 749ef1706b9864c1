//! Full reset → prepare → copy → finalize cycle against a real PostgreSQL.
//!
//! Requires a disposable database, e.g.
//! `docker run -e POSTGRES_PASSWORD=password -p 5432:5432 postgres:17-alpine`,
//! and the connection settings in `CADUCEUS_TEST_DB_*`; run with
//! `cargo test -- --ignored`.

use std::io::Write;
use std::path::Path;

use caduceus_bio::streams::{streams_for_source_folder, trembl_streams};
use caduceus_core::shutdown::ShutdownSignal;
use caduceus_db::adapter::{CopyAdapter, PostgresAdapter};
use caduceus_db::config::{ConnectionConfig, ConnectionPoolConfig, QueueConfig};
use caduceus_db::copier::CopyDriver;
use caduceus_db::lifecycle::UniprotLifecycle;
use caduceus_bio::fasta::FastaChunker;
use caduceus_core::config::UniprotFile;
use sqlx::Row;
use tempfile::TempDir;

const NODES: &str = concat!(
    "9606\t|\t9605\t|\tspecies\t|\tHS\t|\t5\t|\t1\t|\t1\t|\t1\t|\t2\t|\t1\t|\t1\t|\t0\t|\tx\t|\t\t|\t\t|\t1\t|\t0\t|\t1\t|\n",
    "9913\t|\t9903\t|\tspecies\t|\tBT\t|\t2\t|\t1\t|\t1\t|\t1\t|\t2\t|\t1\t|\t1\t|\t0\t|\tx\t|\t\t|\t\t|\t1\t|\t0\t|\t1\t|\n",
    "131567\t|\t1\t|\tno rank\t|\t\t|\t8\t|\t1\t|\t1\t|\t1\t|\t0\t|\t1\t|\t1\t|\t0\t|\t\t|\t\t|\t\t|\t0\t|\t0\t|\t1\t|\n",
    "2759\t|\t131567\t|\tsuperkingdom\t|\t\t|\t1\t|\t0\t|\t1\t|\t0\t|\t1\t|\t0\t|\t0\t|\t0\t|\t\t|\t11\t|\t0\t|\t0\t|\t0\t|\t1\t|\n",
    "33154\t|\t2759\t|\tclade\t|\t\t|\t4\t|\t0\t|\t1\t|\t1\t|\t1\t|\t1\t|\t1\t|\t0\t|\t\t|\t\t|\t0\t|\t0\t|\t0\t|\t1\t|",
);

const NAMES: &str = concat!(
    "9606\t|\tHomo sapiens\t|\t\t|\tscientific name\t|\n",
    "9913\t|\tBos taurus\t|\t\t|\tscientific name\t|\n",
    "131567\t|\tcellular organisms\t|\t\t|\tscientific name\t|\n",
    "2759\t|\tEukaryota\t|\t\t|\tscientific name\t|\n",
    "33154\t|\tOpisthokonta\t|\t\t|\tscientific name\t|",
);

const LINEAGE: &str = "9606\t|\t131567 2759 33154 \t|\n9913\t|\t131567 2759 33154 \t|";

const MERGED: &str = "272461\t|\t9913\t|\n272470\t|\t9606\t|";

const DELNODES: &str = "3122894\t|\n3122893\t|\n3122892\t|";

const SPROT: &str = concat!(
    ">sp|A0JNW5|BLT3B_HUMAN Bridge-like lipid transfer protein family member 3B OS=Homo sapiens OX=9606 GN=BLTP3B PE=1 SV=2\n",
    "MAGIIKKQILKHLSRFTKNLSPDKINLSTLKGEGELKNLELDEEVLQNMLDLPTWLAINK\n",
    ">sp|A0JP26|POTB3_HUMAN POTE ankyrin domain family member B3 OS=Homo sapiens OX=9606 GN=POTEB3 PE=1 SV=2\n",
    "MGKCCHHCFPCCRGSGTSNVGTSGDHDNSFMKTLRSKMGKWCCHCFPCCRGSGKSNVGTW\n",
    ">sp|A0PK11|CLRN2_HUMAN Clarin-2 OS=Homo sapiens OX=9606 GN=CLRN2 PE=1 SV=1\n",
    "MPGWFKKAWYGLASLLSFSSFILIIVALVVPHWLSGKILCQTGVDLVNATDRELVKFIGD\n",
    ">sp|A1L3X0|ELOV7_HUMAN Very long chain fatty acid elongase 7 OS=Homo sapiens OX=9606 GN=ELOVL7 PE=1 SV=1\n",
    "PFELKKAMITYNFFIVLFSVYMCYEFVMSGWGIGYSFRCDIVDYSRSPTALRMARTCWLY\n",
    ">sp|A2A2Y4|FRMD3_HUMAN FERM domain-containing protein 3 OS=Homo sapiens OX=9606 GN=FRMD3 PE=1 SV=1\n",
    "MFASCHCVPRGRRTMKMIHFRSSSVKSLSQEMRCTIRLLDDSEISCHIQRETKGQFLIDH\n",
    ">sp|A2RU14|TM218_HUMAN Transmembrane protein 218 OS=Homo sapiens OX=9606 GN=TMEM218 PE=1 SV=1\n",
    "MAGTVLGVGAGVFILALLWVAVLLLCVLLSRASGAARFSVIFLFFGAVIITSVLLLFPRA\n",
    ">sp|A4D1B5|GSAP_HUMAN Gamma-secretase-activating protein OS=Homo sapiens OX=9606 GN=GSAP PE=1 SV=2\n",
    "MALRLVADFDLGKDVLPWLRAQRAVSEASGAGSGGADVLENDYESLHVLNVERNGNIIYT\n",
    ">sp|A1A519|F170A_HUMAN Protein FAM170A OS=Homo sapiens OX=9606 GN=FAM170A PE=1 SV=1\n",
    "MKRRQKRKHLENEESQETAEKGGGMSKSQEDALQPGSTRVAKGWSQGVGEVTSTSEYCSC\n",
    ">sp|A2RUB6|CCD66_HUMAN Coiled-coil domain-containing protein 66 OS=Homo sapiens OX=9606 GN=CCDC66 PE=1 SV=4\n",
    "CIGSEKLLQKKPVGSETSQAKGEKNGMTFSSTKDLCKQCIDKDCLHIQKEISPATPNMQK\n",
    ">sp|A2RUC4|TYW5_HUMAN tRNA wybutosine-synthesizing protein 5 OS=Homo sapiens OX=9606 GN=TYW5 PE=1 SV=1\n",
    "MAGQHLPVPRLEGVSREQFMQHLYPQRKPLVLEGIDLGPCTSKWTVDYLSQVGGKKEVKI\n",
    "HVAAVAQMDFISKNFVYRTLPFDQLVQRAAEEKHKEFFVSEDEKYYLRSLGEDPRKDVAD",
);

const VARSPLIC: &str = concat!(
    ">sp|P31946-2|1433B_HUMAN Isoform Short of 14-3-3 protein beta/alpha OS=Homo sapiens OX=9606 GN=YWHAB\n",
    "VISSIEQKTERNEKKQQMGKEYREKIEAELQDICNDVLELLDKYLIPNATQPESKVFYLK\n",
    ">sp|Q2LL38-2|AAKG3_BOVIN Isoform 2 of 5'-AMP-activated protein kinase subunit gamma-3 OS=Bos taurus OX=9913 GN=PRKAG3\n",
    "MEPAELEHALCGTPSWSSFGGPEHQEMSFLEQGDSTSWPSPAMTTSAEISLGEQRTKVSR",
);

const TREMBL: &str = concat!(
    ">tr|I7CLV3|I7CLV3_BOVIN Insulin (Fragment) OS=Bos taurus OX=9913 PE=2 SV=1\n",
    "FVNQHLCGSHLVEALYLVCGERGFFYTPKARREVEGPQVGALELAGGPGAGGLEGPPQKR\n",
    ">tr|A5PJB2|A5PJB2_BOVIN Insulin OS=Bos taurus OX=9913 GN=INS PE=2 SV=1\n",
    "MALWTRLAPLLALLALWAPAPARAFVNQHLCGSHLVEALYLVCGERGFFYTPKARREVEG",
);

fn write_fixture(dir: &Path, name: &str, content: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

fn connection_from_env() -> ConnectionConfig {
    let var = |name: &str, default: &str| std::env::var(name).unwrap_or_else(|_| default.to_string());

    ConnectionConfig {
        host: var("CADUCEUS_TEST_DB_HOST", "localhost"),
        port: var("CADUCEUS_TEST_DB_PORT", "5432").parse().unwrap(),
        database: var("CADUCEUS_TEST_DB_NAME", "postgres"),
        user: var("CADUCEUS_TEST_DB_USER", "postgres"),
        password: var("CADUCEUS_TEST_DB_PASSWORD", "password"),
    }
}

#[tokio::test]
#[ignore = "requires a disposable local PostgreSQL"]
async fn setup_copies_fixtures_and_finalize_makes_them_queryable() {
    let dir = TempDir::new().unwrap();
    write_fixture(dir.path(), "nodes.dmp", NODES);
    write_fixture(dir.path(), "names.dmp", NAMES);
    write_fixture(dir.path(), "taxidlineage.dmp", LINEAGE);
    write_fixture(dir.path(), "merged.dmp", MERGED);
    write_fixture(dir.path(), "delnodes.dmp", DELNODES);
    write_fixture(dir.path(), "uniprot_sprot.fasta", SPROT);
    write_fixture(dir.path(), "uniprot_sprot_varsplic.fasta", VARSPLIC);
    write_fixture(dir.path(), "uniprot_trembl.fasta", TREMBL);

    let pool_config = ConnectionPoolConfig {
        connection: connection_from_env(),
        min_size: 1,
        max_size: 4,
    };

    let adapter = PostgresAdapter::new();
    let lifecycle = UniprotLifecycle::new(adapter.clone(), false);
    let pool = adapter.open_pool(&pool_config).await.unwrap();

    lifecycle.reset_database(&pool).await;
    lifecycle.prepare_before_copy(&pool).await.unwrap();

    let mut streams = streams_for_source_folder(dir.path());
    let trembl_path = dir.path().join(UniprotFile::Trembl.file_name());
    let ranges = FastaChunker::new(&trembl_path, 2).chunk_ranges().unwrap();
    streams.extend(trembl_streams(dir.path(), ranges));

    let shutdown = ShutdownSignal::new();
    CopyDriver::new(
        adapter.clone(),
        pool_config.clone(),
        QueueConfig::new(4, 6),
        shutdown,
    )
    .with_batch_size(4)
    .copy(streams)
    .await
    .unwrap();

    lifecycle.finalize_after_copy(&pool).await.unwrap();

    let rows = sqlx::query(
        "SELECT accession FROM uniprot_kb \
         JOIN taxonomy ON ncbi_organism_id = ncbi_taxon_id \
         WHERE ncbi_taxon_id = 9606 AND source = 'sp' AND sequence LIKE '%KHL%' \
         ORDER BY accession",
    )
    .fetch_all(&pool)
    .await
    .unwrap();

    let accessions: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
    assert_eq!(accessions, vec!["A0JNW5", "A1A519"]);

    // merged_id is transient: dropped at the end of finalize.
    let merged_exists: bool = sqlx::query(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = 'merged_id')",
    )
    .fetch_one(&pool)
    .await
    .unwrap()
    .get(0);
    assert!(!merged_exists);

    lifecycle.remove_database(&pool).await.unwrap();
    adapter.close_pool(&pool).await;
}

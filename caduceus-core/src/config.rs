//! Runtime constants: upstream URLs, timeouts, connection caps, file names

use std::path::PathBuf;
use std::time::Duration;

pub const UNIPROT_SP_URL: &str = "https://ftp.uniprot.org/pub/databases/uniprot/\
                                  current_release/knowledgebase/complete/\
                                  uniprot_sprot.fasta.gz";
pub const UNIPROT_SP_ISOFORMS_URL: &str = "https://ftp.uniprot.org/pub/databases/uniprot/\
                                           current_release/knowledgebase/complete/\
                                           uniprot_sprot_varsplic.fasta.gz";
pub const UNIPROT_TR_URL: &str = "https://ftp.uniprot.org/pub/databases/uniprot/\
                                  current_release/knowledgebase/complete/\
                                  uniprot_trembl.fasta.gz";
pub const NCBI_TAXDUMP_URL: &str =
    "https://ftp.ncbi.nlm.nih.gov/pub/taxonomy/new_taxdump/new_taxdump.tar.gz";

/// Size of one streamed download chunk (bytes).
pub const DOWNLOAD_CHUNK_SIZE: usize = 1 << 20;

pub const HEAD_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const LARGE_FILE_TIMEOUT: Duration = Duration::from_secs(3600 * 2);
pub const SMALL_FILE_TIMEOUT: Duration = Duration::from_secs(300);

/// Simultaneous connection limit for the UniProt large-file (TrEMBL) download.
pub const UNIPROT_LARGE_FILE_CONNECTIONS: usize = 18;
/// Connection limit for the UniProt small-file downloads.
pub const UNIPROT_SMALL_FILE_CONNECTIONS: usize = 2;
/// Simultaneous connection limit for the NCBI site.
pub const NCBI_CONNECTIONS: usize = 1;
/// Global connection cap. Must cover every per-site limit above.
pub const MAX_CONNECTIONS: usize =
    UNIPROT_LARGE_FILE_CONNECTIONS + UNIPROT_SMALL_FILE_CONNECTIONS + NCBI_CONNECTIONS;

/// HTTP attempts per request; a fourth attempt is never made.
pub const HTTP_RETRY_ATTEMPTS: usize = 3;
/// Fixed wait between HTTP attempts.
pub const HTTP_RETRY_WAIT: Duration = Duration::from_secs(5);

/// Records accumulated per COPY batch.
pub const COPY_BATCH_SIZE: usize = 10_000;

/// NCBI taxdump members that must be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NcbiFile {
    Ranks,
    Names,
    Lineage,
    Merged,
    Delnodes,
}

impl NcbiFile {
    pub const ALL: [NcbiFile; 5] = [
        NcbiFile::Ranks,
        NcbiFile::Names,
        NcbiFile::Lineage,
        NcbiFile::Merged,
        NcbiFile::Delnodes,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            NcbiFile::Ranks => "nodes.dmp",
            NcbiFile::Names => "names.dmp",
            NcbiFile::Lineage => "taxidlineage.dmp",
            NcbiFile::Merged => "merged.dmp",
            NcbiFile::Delnodes => "delnodes.dmp",
        }
    }
}

/// Decompressed UniProt FASTA files the pipeline reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniprotFile {
    SwissProt,
    SpIsoforms,
    Trembl,
}

impl UniprotFile {
    pub const ALL: [UniprotFile; 3] = [
        UniprotFile::SwissProt,
        UniprotFile::SpIsoforms,
        UniprotFile::Trembl,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            UniprotFile::SwissProt => "uniprot_sprot.fasta",
            UniprotFile::SpIsoforms => "uniprot_sprot_varsplic.fasta",
            UniprotFile::Trembl => "uniprot_trembl.fasta",
        }
    }
}

/// Folder the source archives are downloaded into and read from.
pub fn default_source_folder() -> PathBuf {
    PathBuf::from("source_files")
}

/// Local stamp holding the last-seen upstream `Last-Modified` header.
pub fn last_modified_stamp_path() -> PathBuf {
    PathBuf::from("last_modified.txt")
}

//! DDL batches for every lifecycle phase
//!
//! Tables are created bare; constraints, indexes and foreign keys only
//! appear in the finalize batches, after bulk copy has completed. Batch
//! ordering inside `UNIPROT_KB_AND_TAXONOMY_VALIDATION` is mandatory: the
//! foreign key is created only after the merged-id rewrite, and the
//! `merged_id` table is dropped only after the foreign key exists.

/// A possibly nested batch of queries; executors flatten it.
#[derive(Debug, Clone, Copy)]
pub enum Queries {
    One(&'static str),
    Many(&'static [Queries]),
}

impl Queries {
    pub fn flatten(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        self.collect_into(&mut out);
        out
    }

    fn collect_into(&self, out: &mut Vec<&'static str>) {
        match self {
            Queries::One(query) => out.push(query),
            Queries::Many(queries) => {
                for query in *queries {
                    query.collect_into(out);
                }
            }
        }
    }
}

// Clean table data and indexes when an existing database is being updated.
const TRUNCATE_ALL_TABLES: Queries = Queries::One(
    "TRUNCATE TABLE metadata, taxonomy, lineage, uniprot_kb CASCADE",
);

const DROP_TYPE_SOURCE: Queries =
    Queries::One("DROP TYPE IF EXISTS sequence_source CASCADE");

const DROP_INDEXES: Queries = Queries::Many(&[
    Queries::One("DROP INDEX IF EXISTS ncbi_organism_id_uniprot_kb_idx"),
    Queries::One("DROP INDEX IF EXISTS uniprot_kb_source_idx"),
    Queries::One("DROP INDEX IF EXISTS trgm_sequence_idx"),
    Queries::One("DROP INDEX IF EXISTS trgm_tax_name_idx"),
    Queries::One("DROP INDEX IF EXISTS unique_tax_name_idx"),
    Queries::One("DROP INDEX IF EXISTS unique_taxon_lineage_idpair"),
]);

const DROP_CONSTRAINTS_UNIPROT_KB: Queries = Queries::One(
    "ALTER TABLE IF EXISTS uniprot_kb \
     DROP CONSTRAINT IF EXISTS uniprot_kb_pkey",
);

const DROP_CONSTRAINTS_TAXONOMY: Queries = Queries::One(
    "ALTER TABLE IF EXISTS taxonomy \
     DROP CONSTRAINT IF EXISTS taxonomy_pkey CASCADE, \
     DROP CONSTRAINT IF EXISTS unique_tax_name",
);

const DROP_CONSTRAINTS_LINEAGE: Queries = Queries::One(
    "ALTER TABLE IF EXISTS lineage \
     DROP CONSTRAINT IF EXISTS taxon_lineage_idpair_pkey, \
     DROP CONSTRAINT IF EXISTS unique_taxon_lineage_idpair",
);

const DROP_METADATA: Queries = Queries::One("DROP TABLE IF EXISTS metadata CASCADE");
const DROP_UNIPROT_KB: Queries = Queries::One("DROP TABLE IF EXISTS uniprot_kb CASCADE");
const DROP_TAXONOMY: Queries = Queries::One("DROP TABLE IF EXISTS taxonomy CASCADE");
const DROP_LINEAGE: Queries = Queries::One("DROP TABLE IF EXISTS lineage CASCADE");
const DROP_MERGED_ID: Queries = Queries::One("DROP TABLE IF EXISTS merged_id CASCADE");

// The trigram extension backs the GIN indexes created at finalize.
const CREATE_TRGM_EXTENSION: Queries =
    Queries::One("CREATE EXTENSION IF NOT EXISTS pg_trgm");

const CREATE_SOURCE_ENUM: Queries = Queries::One(
    "CREATE TYPE sequence_source AS ENUM ('sp', 'tr', 'sp_iso', 'tr_iso')",
);

// All tables are created without constraints so the bulk copy runs
// unchecked; validation happens at finalize.
const CREATE_METADATA: Queries = Queries::One(
    "CREATE TABLE IF NOT EXISTS metadata( \
     data_source VARCHAR(100), \
     data_license VARCHAR(100), \
     license_url VARCHAR(250), \
     attribution_required VARCHAR(3))",
);

const CREATE_UNIPROT_KB: Queries = Queries::One(
    "CREATE TABLE IF NOT EXISTS uniprot_kb( \
     source sequence_source, \
     is_reviewed bool, \
     accession VARCHAR(13), \
     entry_name VARCHAR(20), \
     peptide_name VARCHAR(500), \
     ncbi_organism_id INT, \
     organism_name VARCHAR(500), \
     sequence TEXT)",
);

const CREATE_MERGED_ID: Queries = Queries::One(
    "CREATE TABLE IF NOT EXISTS merged_id( \
     deprecated_ncbi_taxon_id INT, \
     current_ncbi_taxon_id INT)",
);

const CREATE_TAXONOMY: Queries = Queries::One(
    "CREATE TABLE IF NOT EXISTS taxonomy( \
     rank VARCHAR(60), \
     ncbi_taxon_id INT, \
     tax_name VARCHAR(1000))",
);

const CREATE_LINEAGE: Queries = Queries::One(
    "CREATE TABLE IF NOT EXISTS lineage( \
     ncbi_taxon_id INT, \
     ncbi_lineage_id INT)",
);

const CREATE_TAXONOMY_TAX_NAME_IDX: Queries = Queries::One(
    "CREATE UNIQUE INDEX unique_tax_name_idx ON taxonomy (tax_name)",
);

const ADD_CONSTRAINTS_TAXONOMY: Queries = Queries::One(
    "ALTER TABLE taxonomy \
     ADD CONSTRAINT taxonomy_pkey PRIMARY KEY (ncbi_taxon_id), \
     ADD CONSTRAINT unique_tax_name UNIQUE USING INDEX unique_tax_name_idx",
);

const ADD_NOT_NULL_TAXONOMY: Queries = Queries::One(
    "ALTER TABLE taxonomy \
     ALTER COLUMN rank SET NOT NULL, \
     ALTER COLUMN tax_name SET NOT NULL",
);

const CREATE_TRGM_IDX_ON_TAXONOMY: Queries = Queries::One(
    "CREATE INDEX trgm_tax_name_idx ON taxonomy USING GIN(tax_name gin_trgm_ops)",
);

// Temporary indexes that make the merged-id rewrite affordable.
const CREATE_TMP_INDEXES: Queries = Queries::Many(&[
    Queries::One(
        "CREATE INDEX IF NOT EXISTS merged_id_tmp_current_ncbi_taxon_id \
         ON merged_id (current_ncbi_taxon_id)",
    ),
    Queries::One(
        "CREATE INDEX IF NOT EXISTS merged_id_tmp_deprecated_ncbi_taxon_id \
         ON merged_id (deprecated_ncbi_taxon_id)",
    ),
    Queries::One(
        "CREATE INDEX IF NOT EXISTS uniprot_kb_tmp_ncbi_organism_id \
         ON uniprot_kb (ncbi_organism_id)",
    ),
]);

// Substitute every deprecated organism id with its current one so the
// foreign key to taxonomy can be created.
const SUBSTITUTE_OUTDATED_NCBI_IDS: Queries = Queries::One(
    "UPDATE uniprot_kb \
     SET ncbi_organism_id = current_ncbi_taxon_id \
     FROM merged_id \
     WHERE deprecated_ncbi_taxon_id IN \
         (SELECT ncbi_organism_id FROM uniprot_kb \
          INTERSECT \
          SELECT deprecated_ncbi_taxon_id FROM merged_id) \
     AND ncbi_organism_id = deprecated_ncbi_taxon_id",
);

const CREATE_NCBI_ID_FKEY_UNIPROT_KB: Queries = Queries::One(
    "ALTER TABLE uniprot_kb \
     ADD CONSTRAINT uniprot_kb_ncbi_organism_id_fkey \
     FOREIGN KEY (ncbi_organism_id) \
     REFERENCES taxonomy (ncbi_taxon_id) \
     ON UPDATE CASCADE",
);

const ADD_NOT_NULL_UNIPROT_KB: Queries = Queries::One(
    "ALTER TABLE uniprot_kb \
     ALTER COLUMN source SET NOT NULL, \
     ALTER COLUMN is_reviewed SET NOT NULL, \
     ALTER COLUMN entry_name SET NOT NULL, \
     ALTER COLUMN peptide_name SET NOT NULL, \
     ALTER COLUMN ncbi_organism_id SET NOT NULL, \
     ALTER COLUMN organism_name SET NOT NULL, \
     ALTER COLUMN sequence SET NOT NULL",
);

const DROP_TMP_INDEXES: Queries = Queries::Many(&[
    Queries::One("DROP INDEX IF EXISTS merged_id_tmp_current_ncbi_taxon_id"),
    Queries::One("DROP INDEX IF EXISTS merged_id_tmp_deprecated_ncbi_taxon_id"),
    Queries::One("DROP INDEX IF EXISTS uniprot_kb_tmp_ncbi_organism_id"),
]);

const ADD_PK_UNIPROT_KB: Queries = Queries::One(
    "ALTER TABLE uniprot_kb ADD CONSTRAINT uniprot_kb_pkey PRIMARY KEY (accession)",
);

const CREATE_INDEXES_UNIPROT_KB: Queries = Queries::Many(&[
    Queries::One(
        "CREATE INDEX IF NOT EXISTS ncbi_organism_id_uniprot_kb_idx \
         ON uniprot_kb (ncbi_organism_id)",
    ),
    Queries::One(
        "CREATE INDEX IF NOT EXISTS uniprot_kb_source_idx ON uniprot_kb (source) \
         WHERE source != 'tr'",
    ),
]);

const CREATE_LINEAGE_IDX: Queries = Queries::One(
    "CREATE UNIQUE INDEX unique_taxon_lineage_idpair \
     ON lineage (ncbi_lineage_id, ncbi_taxon_id)",
);

const ADD_CONSTRAINTS_LINEAGE: Queries = Queries::One(
    "ALTER TABLE lineage \
     ADD CONSTRAINT lineage_ncbi_taxon_id_fkey \
     FOREIGN KEY (ncbi_taxon_id) REFERENCES taxonomy (ncbi_taxon_id) \
     ON DELETE CASCADE ON UPDATE CASCADE, \
     ADD CONSTRAINT lineage_ncbi_lineage_id_fkey \
     FOREIGN KEY (ncbi_lineage_id) REFERENCES taxonomy (ncbi_taxon_id) \
     ON DELETE CASCADE ON UPDATE CASCADE, \
     ADD CONSTRAINT taxon_lineage_idpair_pkey \
     PRIMARY KEY (ncbi_taxon_id, ncbi_lineage_id), \
     ADD CONSTRAINT unique_taxon_lineage_idpair \
     UNIQUE USING INDEX unique_taxon_lineage_idpair",
);

const ADD_NOT_NULL_LINEAGE: Queries = Queries::One(
    "ALTER TABLE lineage \
     ALTER COLUMN ncbi_taxon_id SET NOT NULL, \
     ALTER COLUMN ncbi_lineage_id SET NOT NULL",
);

const UNIPROT_KB_COMMENTS: Queries = Queries::Many(&[
    Queries::One(
        "COMMENT ON TABLE uniprot_kb IS \
         'All peptide records (Swiss-Prot, TrEMBL, reviewed isoforms).'",
    ),
    Queries::One(
        "COMMENT ON COLUMN uniprot_kb.source IS \
         'Source sequence was added from (Swiss-Prot/TrEMBL/reviewed isoforms).'",
    ),
    Queries::One(
        "COMMENT ON COLUMN uniprot_kb.is_reviewed IS 'Was sequence reviewed manually.'",
    ),
    Queries::One("COMMENT ON COLUMN uniprot_kb.accession IS 'Sequence ID, PK.'"),
    Queries::One(
        "COMMENT ON COLUMN uniprot_kb.entry_name IS \
         'Former sequence ID with biological info.'",
    ),
    Queries::One("COMMENT ON COLUMN uniprot_kb.peptide_name IS 'Peptide name.'"),
    Queries::One(
        "COMMENT ON COLUMN uniprot_kb.ncbi_organism_id IS \
         'ID of the organism that possesses this peptide, FK.'",
    ),
    Queries::One(
        "COMMENT ON COLUMN uniprot_kb.organism_name IS \
         'Organism name that possesses this peptide.'",
    ),
    Queries::One("COMMENT ON COLUMN uniprot_kb.sequence IS 'Peptide sequence itself.'"),
]);

const TAXONOMY_COMMENTS: Queries = Queries::Many(&[
    Queries::One("COMMENT ON TABLE taxonomy IS 'Taxonomy info.'"),
    Queries::One("COMMENT ON COLUMN taxonomy.ncbi_taxon_id IS 'NCBI taxon ID, PK.'"),
    Queries::One(
        "COMMENT ON COLUMN taxonomy.tax_name IS 'Taxon name with NCBI taxon ID.'",
    ),
    Queries::One("COMMENT ON COLUMN taxonomy.rank IS 'Rank of the taxon.'"),
]);

const LINEAGE_COMMENTS: Queries = Queries::Many(&[
    Queries::One("COMMENT ON TABLE lineage IS 'Lineage taxons that correspond to organism.'"),
    Queries::One(
        "COMMENT ON COLUMN lineage.ncbi_taxon_id IS \
         'NCBI taxon ID of the organism that possesses lineage taxons, FK.'",
    ),
    Queries::One(
        "COMMENT ON COLUMN lineage.ncbi_lineage_id IS \
         'NCBI lineage taxon ID that is possessed by organism, FK.'",
    ),
]);

const INSERT_METADATA: Queries = Queries::One(
    "INSERT INTO metadata(data_source, data_license, license_url, attribution_required) \
     VALUES \
     ('UniProt Knowledgebase FTP', 'CC BY 4.0', \
      'https://creativecommons.org/licenses/by/4.0/', 'Yes'), \
     ('NCBI FTP', 'Public unrestricted scientific data', \
      'https://www.ncbi.nlm.nih.gov/home/about/policies/', 'Yes')",
);

// This index grows very large; it is only built on request.
pub const CREATE_TRGM_IDX_ON_UNIPROT_KB: Queries = Queries::One(
    "CREATE INDEX trgm_sequence_idx ON uniprot_kb USING GIN(sequence gin_trgm_ops)",
);

pub const REMOVE_DATABASE: Queries = Queries::Many(&[
    DROP_TYPE_SOURCE,
    DROP_INDEXES,
    DROP_CONSTRAINTS_UNIPROT_KB,
    DROP_CONSTRAINTS_TAXONOMY,
    DROP_CONSTRAINTS_LINEAGE,
    DROP_METADATA,
    DROP_UNIPROT_KB,
    DROP_TAXONOMY,
    DROP_LINEAGE,
    DROP_MERGED_ID,
]);

pub const RESET_DATABASE: Queries = Queries::Many(&[TRUNCATE_ALL_TABLES, REMOVE_DATABASE]);

pub const PREPARATION: Queries = Queries::Many(&[CREATE_TRGM_EXTENSION, CREATE_SOURCE_ENUM]);

pub const TABLE_CREATION: Queries = Queries::Many(&[
    CREATE_METADATA,
    CREATE_UNIPROT_KB,
    CREATE_MERGED_ID,
    CREATE_TAXONOMY,
    CREATE_LINEAGE,
]);

pub const COMMENTS: Queries = Queries::Many(&[
    UNIPROT_KB_COMMENTS,
    TAXONOMY_COMMENTS,
    LINEAGE_COMMENTS,
    INSERT_METADATA,
]);

const TAXONOMY_CONSTRAINTS_AND_INDEXES: Queries = Queries::Many(&[
    CREATE_TAXONOMY_TAX_NAME_IDX,
    ADD_CONSTRAINTS_TAXONOMY,
    ADD_NOT_NULL_TAXONOMY,
    CREATE_TRGM_IDX_ON_TAXONOMY,
]);

const LINEAGE_CONSTRAINTS_AND_INDEXES: Queries = Queries::Many(&[
    CREATE_LINEAGE_IDX,
    ADD_CONSTRAINTS_LINEAGE,
    ADD_NOT_NULL_LINEAGE,
]);

pub const TAXONOMY_AND_LINEAGE_CONSTRAINTS: Queries = Queries::Many(&[
    TAXONOMY_CONSTRAINTS_AND_INDEXES,
    LINEAGE_CONSTRAINTS_AND_INDEXES,
]);

pub const UNIPROT_KB_AND_TAXONOMY_VALIDATION: Queries = Queries::Many(&[
    CREATE_TMP_INDEXES,
    SUBSTITUTE_OUTDATED_NCBI_IDS,
    CREATE_NCBI_ID_FKEY_UNIPROT_KB,
    ADD_NOT_NULL_UNIPROT_KB,
    DROP_TMP_INDEXES,
    DROP_MERGED_ID,
    ADD_PK_UNIPROT_KB,
    CREATE_INDEXES_UNIPROT_KB,
]);

//! SQL schema for the Serotrack SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.
//!
//! No table carries a treatment-status column: status is derived at read
//! time from titer data, so there is no stored copy to drift.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS patients (
    patient_id            TEXT PRIMARY KEY,
    medical_record_number TEXT NOT NULL UNIQUE,
    name                  TEXT,
    date_of_birth         TEXT,            -- ISO 8601 date
    taxpayer_number       TEXT UNIQUE,
    diagnosis_date        TEXT,            -- ISO 8601 date
    created_at            TEXT NOT NULL,   -- ISO 8601 UTC; server-assigned
    updated_at            TEXT
);

-- Owned by a patient; removed by the explicit cascade in delete_patient.
CREATE TABLE IF NOT EXISTS case_histories (
    case_id        TEXT PRIMARY KEY,
    patient_id     TEXT NOT NULL REFERENCES patients(patient_id),
    titer_result   TEXT NOT NULL,          -- canonical titer string
    diagnosis_date TEXT NOT NULL,
    treatments     TEXT NOT NULL DEFAULT '[]',  -- JSON list of courses
    notes          TEXT,
    created_at     TEXT NOT NULL,
    updated_at     TEXT
);

CREATE TABLE IF NOT EXISTS follow_up_tests (
    test_id    TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL REFERENCES patients(patient_id),
    case_id    TEXT REFERENCES case_histories(case_id),
    test_date  TEXT NOT NULL,
    test_type  TEXT NOT NULL,              -- assay name, e.g. 'RPR'
    result     TEXT NOT NULL,              -- 'reactive' | 'non_reactive' | 'inconclusive'
    titer      TEXT,
    notes      TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS patients_mrn_idx      ON patients(medical_record_number);
CREATE INDEX IF NOT EXISTS cases_patient_idx     ON case_histories(patient_id);
CREATE INDEX IF NOT EXISTS cases_diagnosis_idx   ON case_histories(diagnosis_date);
CREATE INDEX IF NOT EXISTS follow_ups_patient_idx ON follow_up_tests(patient_id);

PRAGMA user_version = 1;
";

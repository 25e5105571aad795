//! [`SqliteStore`] — the SQLite implementation of [`CaseStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use serotrack_core::{
  case::{
    CaseHistoryRecord, CaseHistoryUpdate, FollowUpTest, NewCaseHistory,
    NewFollowUpTest,
  },
  patient::{NewPatient, Patient, PatientUpdate},
  store::CaseStore,
};

use crate::{
  Error, Result,
  encode::{
    RawCaseHistory, RawFollowUpTest, RawPatient, encode_date, encode_dt,
    encode_reactivity, encode_titer, encode_treatments, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Constraint mapping ──────────────────────────────────────────────────────

/// Map a UNIQUE-constraint failure surfaced mid-write to the matching
/// conflict error. The pre-write uniqueness check catches duplicates on the
/// common path; this covers a competing write landing between the check and
/// the insert, which must still read as a conflict rather than a generic
/// database error.
pub(crate) fn unique_violation(
  err: tokio_rusqlite::Error,
  mrn: &str,
  taxpayer_number: Option<&str>,
) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
    e,
    Some(msg),
  )) = &err
    && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  {
    if msg.contains("patients.medical_record_number") {
      return Error::DuplicateMrn(mrn.to_owned());
    }
    if let Some(tin) = taxpayer_number
      && msg.contains("patients.taxpayer_number")
    {
      return Error::DuplicateTaxpayerNumber(tin.to_owned());
    }
  }
  Error::Database(err)
}

// ─── Row value bundles ───────────────────────────────────────────────────────

/// Pre-encoded column values for a `patients` row, ready to move into a
/// connection closure.
struct PatientRow {
  patient_id:            String,
  medical_record_number: String,
  name:                  Option<String>,
  date_of_birth:         Option<String>,
  taxpayer_number:       Option<String>,
  diagnosis_date:        Option<String>,
  created_at:            String,
  updated_at:            Option<String>,
}

impl PatientRow {
  fn encode(p: &Patient) -> Self {
    Self {
      patient_id:            encode_uuid(p.patient_id),
      medical_record_number: p.medical_record_number.clone(),
      name:                  p.name.clone(),
      date_of_birth:         p.date_of_birth.map(encode_date),
      taxpayer_number:       p.taxpayer_number.clone(),
      diagnosis_date:        p.diagnosis_date.map(encode_date),
      created_at:            encode_dt(p.created_at),
      updated_at:            p.updated_at.map(encode_dt),
    }
  }

  fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO patients (
         patient_id, medical_record_number, name, date_of_birth,
         taxpayer_number, diagnosis_date, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      rusqlite::params![
        self.patient_id,
        self.medical_record_number,
        self.name,
        self.date_of_birth,
        self.taxpayer_number,
        self.diagnosis_date,
        self.created_at,
        self.updated_at,
      ],
    )?;
    Ok(())
  }
}

/// Pre-encoded column values for a `case_histories` row.
struct CaseRow {
  case_id:        String,
  patient_id:     String,
  titer_result:   String,
  diagnosis_date: String,
  treatments:     String,
  notes:          Option<String>,
  created_at:     String,
  updated_at:     Option<String>,
}

impl CaseRow {
  fn encode(r: &CaseHistoryRecord) -> Result<Self> {
    Ok(Self {
      case_id:        encode_uuid(r.case_id),
      patient_id:     encode_uuid(r.patient_id),
      titer_result:   encode_titer(r.titer_result),
      diagnosis_date: encode_date(r.diagnosis_date),
      treatments:     encode_treatments(&r.treatments)?,
      notes:          r.notes.clone(),
      created_at:     encode_dt(r.created_at),
      updated_at:     r.updated_at.map(encode_dt),
    })
  }

  fn insert(&self, conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO case_histories (
         case_id, patient_id, titer_result, diagnosis_date,
         treatments, notes, created_at, updated_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
      rusqlite::params![
        self.case_id,
        self.patient_id,
        self.titer_result,
        self.diagnosis_date,
        self.treatments,
        self.notes,
        self.created_at,
        self.updated_at,
      ],
    )?;
    Ok(())
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Serotrack case store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Check MRN and taxpayer-number uniqueness before a write. `exclude`
  /// skips the patient being updated so a no-op rewrite of its own MRN is
  /// not a conflict.
  async fn uniqueness_check(
    &self,
    mrn: Option<String>,
    taxpayer_number: Option<String>,
    exclude: Option<Uuid>,
  ) -> Result<()> {
    if mrn.is_none() && taxpayer_number.is_none() {
      return Ok(());
    }

    let mrn_value = mrn.clone();
    let tin_value = taxpayer_number.clone();
    let exclude_str = exclude.map(encode_uuid);

    let (mrn_taken, tin_taken): (bool, bool) = self
      .conn
      .call(move |conn| {
        let mrn_taken = match &mrn {
          Some(m) => conn
            .query_row(
              "SELECT 1 FROM patients
               WHERE medical_record_number = ?1
                 AND (?2 IS NULL OR patient_id != ?2)",
              rusqlite::params![m, exclude_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
          None => false,
        };

        let tin_taken = match &taxpayer_number {
          Some(t) => conn
            .query_row(
              "SELECT 1 FROM patients
               WHERE taxpayer_number = ?1
                 AND (?2 IS NULL OR patient_id != ?2)",
              rusqlite::params![t, exclude_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
          None => false,
        };

        Ok((mrn_taken, tin_taken))
      })
      .await?;

    if mrn_taken {
      return Err(Error::DuplicateMrn(mrn_value.unwrap_or_default()));
    }
    if tin_taken {
      return Err(Error::DuplicateTaxpayerNumber(
        tin_value.unwrap_or_default(),
      ));
    }
    Ok(())
  }

  async fn patient_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM patients WHERE patient_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  async fn case_exists(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM case_histories WHERE case_id = ?1",
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }
}

// ─── CaseStore impl ──────────────────────────────────────────────────────────

impl CaseStore for SqliteStore {
  type Error = Error;

  // ── Patients ──────────────────────────────────────────────────────────────

  async fn create_patient(&self, input: NewPatient) -> Result<Patient> {
    self
      .uniqueness_check(
        Some(input.medical_record_number.clone()),
        input.taxpayer_number.clone(),
        None,
      )
      .await?;

    let now = Utc::now();
    let patient = Patient {
      patient_id: Uuid::new_v4(),
      medical_record_number: input.medical_record_number,
      name: input.name,
      date_of_birth: input.date_of_birth,
      taxpayer_number: input.taxpayer_number,
      diagnosis_date: input.diagnosis_date,
      created_at: now,
      updated_at: None,
    };

    let intake_case = input
      .initial_case
      .map(|c| {
        let record_input = c.into_new_case(patient.patient_id);
        CaseRow::encode(&CaseHistoryRecord {
          case_id: Uuid::new_v4(),
          patient_id: record_input.patient_id,
          titer_result: record_input.titer_result,
          diagnosis_date: record_input.diagnosis_date,
          treatments: record_input.treatments,
          notes: record_input.notes,
          created_at: now,
          updated_at: None,
        })
      })
      .transpose()?;

    let patient_row = PatientRow::encode(&patient);

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        patient_row.insert(&tx)?;
        if let Some(case_row) = &intake_case {
          case_row.insert(&tx)?;
        }
        tx.commit()?;
        Ok(())
      })
      .await
      .map_err(|e| {
        unique_violation(
          e,
          &patient.medical_record_number,
          patient.taxpayer_number.as_deref(),
        )
      })?;

    Ok(patient)
  }

  async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPatient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM patients WHERE patient_id = ?1",
                RawPatient::COLUMNS
              ),
              rusqlite::params![id_str],
              RawPatient::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPatient::into_patient).transpose()
  }

  async fn find_patient_by_mrn(&self, mrn: &str) -> Result<Option<Patient>> {
    let mrn_owned = mrn.to_owned();

    let raw: Option<RawPatient> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM patients WHERE medical_record_number = ?1",
                RawPatient::COLUMNS
              ),
              rusqlite::params![mrn_owned],
              RawPatient::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPatient::into_patient).transpose()
  }

  async fn list_patients(&self) -> Result<Vec<Patient>> {
    let raws: Vec<RawPatient> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM patients ORDER BY created_at",
          RawPatient::COLUMNS
        ))?;
        let rows = stmt
          .query_map([], RawPatient::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPatient::into_patient).collect()
  }

  async fn update_patient(
    &self,
    id: Uuid,
    update: PatientUpdate,
  ) -> Result<Patient> {
    let mut patient = self
      .get_patient(id)
      .await?
      .ok_or(Error::PatientNotFound(id))?;

    if update.is_empty() {
      return Ok(patient);
    }

    // Re-check uniqueness only for identifiers that actually change.
    let new_mrn = update
      .medical_record_number
      .clone()
      .filter(|m| *m != patient.medical_record_number);
    let new_tin = update
      .taxpayer_number
      .clone()
      .filter(|t| Some(t) != patient.taxpayer_number.as_ref());
    self.uniqueness_check(new_mrn, new_tin, Some(id)).await?;

    update.apply(&mut patient);
    patient.updated_at = Some(Utc::now());

    let row = PatientRow::encode(&patient);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE patients SET
             medical_record_number = ?2, name = ?3, date_of_birth = ?4,
             taxpayer_number = ?5, diagnosis_date = ?6, updated_at = ?7
           WHERE patient_id = ?1",
          rusqlite::params![
            row.patient_id,
            row.medical_record_number,
            row.name,
            row.date_of_birth,
            row.taxpayer_number,
            row.diagnosis_date,
            row.updated_at,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(|e| {
        unique_violation(
          e,
          &patient.medical_record_number,
          patient.taxpayer_number.as_deref(),
        )
      })?;

    Ok(patient)
  }

  async fn delete_patient(&self, id: Uuid) -> Result<()> {
    if !self.patient_exists(id).await? {
      return Err(Error::PatientNotFound(id));
    }

    let id_str = encode_uuid(id);

    // Explicit ownership cascade, all three deletes in one transaction.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM follow_up_tests WHERE patient_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM case_histories WHERE patient_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM patients WHERE patient_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(())
  }

  // ── Case histories ────────────────────────────────────────────────────────

  async fn record_case(&self, input: NewCaseHistory) -> Result<CaseHistoryRecord> {
    if !self.patient_exists(input.patient_id).await? {
      return Err(Error::PatientNotFound(input.patient_id));
    }

    let record = CaseHistoryRecord {
      case_id:        Uuid::new_v4(),
      patient_id:     input.patient_id,
      titer_result:   input.titer_result,
      diagnosis_date: input.diagnosis_date,
      treatments:     input.treatments,
      notes:          input.notes,
      created_at:     Utc::now(),
      updated_at:     None,
    };

    let row = CaseRow::encode(&record)?;

    self
      .conn
      .call(move |conn| {
        row.insert(conn)?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  async fn get_case(&self, id: Uuid) -> Result<Option<CaseHistoryRecord>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCaseHistory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM case_histories WHERE case_id = ?1",
                RawCaseHistory::COLUMNS
              ),
              rusqlite::params![id_str],
              RawCaseHistory::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCaseHistory::into_record).transpose()
  }

  async fn list_cases(&self, patient_id: Uuid) -> Result<Vec<CaseHistoryRecord>> {
    let id_str = encode_uuid(patient_id);

    let raws: Vec<RawCaseHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM case_histories
           WHERE patient_id = ?1
           ORDER BY diagnosis_date DESC, created_at DESC",
          RawCaseHistory::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawCaseHistory::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCaseHistory::into_record).collect()
  }

  async fn update_case(
    &self,
    id: Uuid,
    update: CaseHistoryUpdate,
  ) -> Result<CaseHistoryRecord> {
    let mut record = self.get_case(id).await?.ok_or(Error::CaseNotFound(id))?;

    if update.is_empty() {
      return Ok(record);
    }

    update.apply(&mut record);
    record.updated_at = Some(Utc::now());

    let row = CaseRow::encode(&record)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE case_histories SET
             titer_result = ?2, diagnosis_date = ?3, treatments = ?4,
             notes = ?5, updated_at = ?6
           WHERE case_id = ?1",
          rusqlite::params![
            row.case_id,
            row.titer_result,
            row.diagnosis_date,
            row.treatments,
            row.notes,
            row.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(record)
  }

  // ── Follow-up tests ───────────────────────────────────────────────────────

  async fn record_follow_up(&self, input: NewFollowUpTest) -> Result<FollowUpTest> {
    if !self.patient_exists(input.patient_id).await? {
      return Err(Error::PatientNotFound(input.patient_id));
    }
    if let Some(case_id) = input.case_id
      && !self.case_exists(case_id).await?
    {
      return Err(Error::CaseNotFound(case_id));
    }

    let test = FollowUpTest {
      test_id:    Uuid::new_v4(),
      patient_id: input.patient_id,
      case_id:    input.case_id,
      test_date:  input.test_date,
      test_type:  input.test_type,
      result:     input.result,
      titer:      input.titer,
      notes:      input.notes,
      created_at: Utc::now(),
    };

    let test_id_str    = encode_uuid(test.test_id);
    let patient_id_str = encode_uuid(test.patient_id);
    let case_id_str    = test.case_id.map(encode_uuid);
    let test_date_str  = encode_date(test.test_date);
    let test_type      = test.test_type.clone();
    let result_str     = encode_reactivity(test.result).to_owned();
    let titer_str      = test.titer.map(encode_titer);
    let notes          = test.notes.clone();
    let created_at_str = encode_dt(test.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO follow_up_tests (
             test_id, patient_id, case_id, test_date, test_type,
             result, titer, notes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            test_id_str,
            patient_id_str,
            case_id_str,
            test_date_str,
            test_type,
            result_str,
            titer_str,
            notes,
            created_at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(test)
  }

  async fn get_follow_up(&self, id: Uuid) -> Result<Option<FollowUpTest>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawFollowUpTest> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {} FROM follow_up_tests WHERE test_id = ?1",
                RawFollowUpTest::COLUMNS
              ),
              rusqlite::params![id_str],
              RawFollowUpTest::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawFollowUpTest::into_test).transpose()
  }

  async fn list_follow_ups(&self, patient_id: Uuid) -> Result<Vec<FollowUpTest>> {
    let id_str = encode_uuid(patient_id);

    let raws: Vec<RawFollowUpTest> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {} FROM follow_up_tests
           WHERE patient_id = ?1
           ORDER BY test_date DESC, created_at DESC",
          RawFollowUpTest::COLUMNS
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], RawFollowUpTest::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawFollowUpTest::into_test).collect()
  }

  async fn delete_follow_up(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM follow_up_tests WHERE test_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if deleted == 0 {
      return Err(Error::TestNotFound(id));
    }
    Ok(())
  }
}

//! Service facade.
//!
//! Owns one SQLite connection behind a `Mutex`. Every public operation takes
//! the lock for its whole duration and reads "now" from the injected clock.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use uuid::Uuid;

use super::knowledge::KnowledgeBase;
use super::types::{BatchSummary, GateDecision, SurveillanceError};
use super::{engine, gate, lifecycle};
use crate::clock::Clock;
use crate::config::SurveillanceConfig;
use crate::db::repository::{insert_medication, insert_patient, list_recent_runs};
use crate::db::sqlite::open_database;
use crate::identity::IdentityResolver;
use crate::models::{
    AcknowledgmentRequest, AdrAlert, AlertAcknowledgment, AlertFilter, AlertOutcome, AlertScope,
    Medication, NewObservation, Observation, Patient, ProviderNotification, SurveillanceRun,
};

pub struct SurveillanceService {
    conn: Mutex<Connection>,
    clock: Arc<dyn Clock>,
    identity: Arc<dyn IdentityResolver>,
    config: SurveillanceConfig,
}

impl SurveillanceService {
    /// Wrap an already-migrated connection.
    pub fn new(
        conn: Connection,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityResolver>,
        config: SurveillanceConfig,
    ) -> Self {
        Self {
            conn: Mutex::new(conn),
            clock,
            identity,
            config,
        }
    }

    /// Open (and migrate) the database at `path`.
    pub fn open(
        path: &Path,
        clock: Arc<dyn Clock>,
        identity: Arc<dyn IdentityResolver>,
        config: SurveillanceConfig,
    ) -> Result<Self, SurveillanceError> {
        let conn = open_database(path)?;
        tracing::info!(path = %path.display(), "Surveillance database opened");
        Ok(Self::new(conn, clock, identity, config))
    }

    pub fn config(&self) -> &SurveillanceConfig {
        &self.config
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, SurveillanceError> {
        self.conn.lock().map_err(|_| SurveillanceError::LockPoisoned)
    }

    // ── Reference data ──────────────────────────────────────────────────

    /// Insert the knowledge base if the table is empty.
    pub fn seed_knowledge_base(&self, kb: &KnowledgeBase) -> Result<usize, SurveillanceError> {
        let conn = self.conn()?;
        kb.seed(&conn, self.clock.now())
    }

    /// Mirror a patient record from the clinical record system.
    pub fn upsert_patient(&self, patient: &Patient) -> Result<(), SurveillanceError> {
        let conn = self.conn()?;
        insert_patient(&conn, patient)?;
        Ok(())
    }

    /// Mirror a medication record from the clinical record system.
    pub fn upsert_medication(&self, medication: &Medication) -> Result<(), SurveillanceError> {
        let conn = self.conn()?;
        insert_medication(&conn, medication)?;
        Ok(())
    }

    // ── Surveillance ────────────────────────────────────────────────────

    /// Store an observation and run surveillance on it inline.
    pub fn record_observation(
        &self,
        new: &NewObservation,
    ) -> Result<(Observation, Vec<AdrAlert>), SurveillanceError> {
        let conn = self.conn()?;
        let now = self.clock.now();
        let observation = engine::store_observation(&conn, new, now)?;
        let alerts = engine::evaluate_observation(&conn, &observation.id, now, &self.config)?;
        Ok((observation, alerts))
    }

    pub fn evaluate_observation(&self, observation_id: &Uuid) -> Result<Vec<AdrAlert>, SurveillanceError> {
        let conn = self.conn()?;
        engine::evaluate_observation(&conn, observation_id, self.clock.now(), &self.config)
    }

    /// Sweep unsurveyed observations. `None` uses the configured lookback.
    pub fn batch_surveillance(
        &self,
        facility_id: Option<&Uuid>,
        lookback_hours: Option<i64>,
    ) -> Result<BatchSummary, SurveillanceError> {
        let conn = self.conn()?;
        let lookback = lookback_hours.unwrap_or(self.config.batch_lookback_hours);
        engine::batch_surveillance(&conn, facility_id, lookback, self.clock.now(), &self.config)
    }

    pub fn recent_runs(&self, limit: u32) -> Result<Vec<SurveillanceRun>, SurveillanceError> {
        let conn = self.conn()?;
        Ok(list_recent_runs(&conn, limit)?)
    }

    // ── Alerts ──────────────────────────────────────────────────────────

    pub fn list_active_alerts(
        &self,
        scope: &AlertScope,
        filter: &AlertFilter,
    ) -> Result<Vec<AdrAlert>, SurveillanceError> {
        let conn = self.conn()?;
        lifecycle::active_alerts(&conn, scope, filter)
    }

    pub fn get_alert(&self, alert_id: &Uuid) -> Result<AdrAlert, SurveillanceError> {
        let conn = self.conn()?;
        lifecycle::load_alert(&conn, alert_id)
    }

    pub fn escalate_to_pharmacist(
        &self,
        alert_id: &Uuid,
        notes: Option<&str>,
    ) -> Result<AdrAlert, SurveillanceError> {
        let conn = self.conn()?;
        lifecycle::escalate_to_pharmacist(&conn, alert_id, notes, self.clock.now())
    }

    pub fn notify_provider(
        &self,
        alert_id: &Uuid,
        note: &ProviderNotification,
    ) -> Result<AdrAlert, SurveillanceError> {
        let conn = self.conn()?;
        lifecycle::notify_provider(&conn, alert_id, note, self.clock.now())
    }

    pub fn resolve(
        &self,
        alert_id: &Uuid,
        outcome: AlertOutcome,
        outcome_notes: &str,
        action_taken: Option<&str>,
        resolver: &Uuid,
    ) -> Result<AdrAlert, SurveillanceError> {
        let conn = self.conn()?;
        lifecycle::resolve(&conn, alert_id, outcome, outcome_notes, action_taken, resolver, self.clock.now())
    }

    // ── Acknowledgment gate ─────────────────────────────────────────────

    /// Record an acknowledgment for `staff_id`.
    ///
    /// If the staff member already holds a valid acknowledgment of this
    /// alert, that record is returned unchanged and nothing is written. This
    /// includes HOLD_MEDICATION requests: check `is_hold()` on the result to
    /// see whether a hold is in force.
    pub fn acknowledge(
        &self,
        alert_id: &Uuid,
        staff_id: &Uuid,
        request: &AcknowledgmentRequest,
    ) -> Result<AlertAcknowledgment, SurveillanceError> {
        let conn = self.conn()?;
        gate::record_acknowledgment(
            &conn,
            alert_id,
            staff_id,
            request,
            self.clock.now(),
            self.config.acknowledgment_validity_hours,
        )
    }

    /// Acknowledge as the staff member the identity resolver reports.
    pub fn acknowledge_as_current(
        &self,
        alert_id: &Uuid,
        request: &AcknowledgmentRequest,
    ) -> Result<AlertAcknowledgment, SurveillanceError> {
        let staff = self.identity.current_staff().ok_or(SurveillanceError::NoCurrentStaff)?;
        self.acknowledge(alert_id, &staff.id, request)
    }

    pub fn check_can_administer(
        &self,
        patient_id: &Uuid,
        staff_id: &Uuid,
        medication_id: &Uuid,
    ) -> Result<GateDecision, SurveillanceError> {
        let conn = self.conn()?;
        gate::check_can_administer(&conn, patient_id, staff_id, medication_id, self.clock.now())
    }

    pub fn acknowledgment_history(&self, alert_id: &Uuid) -> Result<Vec<AlertAcknowledgment>, SurveillanceError> {
        let conn = self.conn()?;
        gate::acknowledgment_history(&conn, alert_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, SystemClock};
    use crate::db::sqlite::open_memory_database;
    use crate::identity::{FixedIdentity, StaffMember, StaffRole};
    use crate::models::enums::{AlertStatus, ConfidenceLevel, MedicationStatus, RunType};
    use crate::models::{HoldDetails, SafetyVerifications};
    use crate::surveillance::engine::test_support::{at, date, digoxin_observation};
    use crate::surveillance::types::{BlockReason, ErrorKind};
    use chrono::Duration;

    struct Ward {
        service: SurveillanceService,
        clock: Arc<ManualClock>,
        patient: Patient,
        digoxin: Medication,
        nurse: StaffMember,
    }

    fn ward(signed_in: bool) -> Ward {
        let clock = Arc::new(ManualClock::new(at(date(2024, 3, 31), 9)));
        let facility_id = Uuid::new_v4();
        let nurse = StaffMember {
            id: Uuid::new_v4(),
            display_name: "R. Osei".into(),
            role: StaffRole::Rn,
            facility_id,
        };
        let identity = FixedIdentity(signed_in.then(|| nurse.clone()));
        let service = SurveillanceService::new(
            open_memory_database().unwrap(),
            clock.clone(),
            Arc::new(identity),
            SurveillanceConfig::default(),
        );
        service.seed_knowledge_base(&KnowledgeBase::load_test()).unwrap();

        let patient = Patient {
            id: Uuid::new_v4(),
            facility_id,
            first_name: "Ada".into(),
            last_name: "Moreau".into(),
            date_of_birth: Some(date(1941, 7, 4)),
            is_hospice: false,
            comfort_measures_only: false,
            hospice_agency: None,
            hospice_nurse_name: None,
            hospice_nurse_phone: None,
        };
        service.upsert_patient(&patient).unwrap();
        let digoxin = Medication {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            name: "Digoxin".into(),
            generic_name: Some("digoxin".into()),
            drug_class: None,
            dose: Some("0.125 mg daily".into()),
            start_date: Some(date(2024, 3, 1)),
            status: MedicationStatus::Active,
        };
        service.upsert_medication(&digoxin).unwrap();

        Ward { service, clock, patient, digoxin, nurse }
    }

    fn ack() -> AcknowledgmentRequest {
        AcknowledgmentRequest::acknowledge(SafetyVerifications::all())
    }

    #[test]
    fn observation_to_administration_flow() {
        let w = ward(true);
        let (observation, alerts) = w.service.record_observation(&digoxin_observation(w.patient.id)).unwrap();
        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.observation_id, observation.id);
        assert!(matches!(alert.confidence, ConfidenceLevel::High | ConfidenceLevel::VeryHigh));

        let before = w.service.check_can_administer(&w.patient.id, &w.nurse.id, &w.digoxin.id).unwrap();
        assert!(!before.allowed);
        assert_eq!(before.blocking_alerts[0].reason, BlockReason::Unacknowledged);

        w.service.acknowledge_as_current(&alert.id, &ack()).unwrap();
        let after = w.service.check_can_administer(&w.patient.id, &w.nurse.id, &w.digoxin.id).unwrap();
        assert!(after.allowed);
        assert_eq!(w.service.get_alert(&alert.id).unwrap().status, AlertStatus::Acknowledged);
    }

    #[test]
    fn acknowledgment_expires_on_the_clock() {
        let w = ward(true);
        let (_, alerts) = w.service.record_observation(&digoxin_observation(w.patient.id)).unwrap();
        let alert_id = alerts[0].id;
        let other_nurse = Uuid::new_v4();
        w.service.acknowledge(&alert_id, &w.nurse.id, &ack()).unwrap();

        w.clock.advance(Duration::hours(13));
        let a = w.service.check_can_administer(&w.patient.id, &w.nurse.id, &w.digoxin.id).unwrap();
        let b = w.service.check_can_administer(&w.patient.id, &other_nurse, &w.digoxin.id).unwrap();
        assert_eq!(a.blocking_alerts[0].reason, BlockReason::Expired);
        assert_eq!(b.blocking_alerts[0].reason, BlockReason::Unacknowledged);

        w.service.acknowledge(&alert_id, &w.nurse.id, &ack()).unwrap();
        assert_eq!(w.service.acknowledgment_history(&alert_id).unwrap().len(), 2);
        assert!(w.service.check_can_administer(&w.patient.id, &w.nurse.id, &w.digoxin.id).unwrap().allowed);
    }

    #[test]
    fn hold_then_resolve() {
        let w = ward(true);
        let (_, alerts) = w.service.record_observation(&digoxin_observation(w.patient.id)).unwrap();
        let alert_id = alerts[0].id;
        let hold = AcknowledgmentRequest::hold(
            SafetyVerifications::all(),
            HoldDetails {
                reason: "HR 48".into(),
                duration: None,
                provider_notified: Some(true),
                hold_order_obtained: true,
            },
        );
        w.service.acknowledge(&alert_id, &w.nurse.id, &hold).unwrap();
        let decision = w.service.check_can_administer(&w.patient.id, &w.nurse.id, &w.digoxin.id).unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.held_medications[0].medication_id, w.digoxin.id);

        w.service
            .notify_provider(
                &alert_id,
                &ProviderNotification {
                    method: "phone".into(),
                    provider_name: "Dr. Chen".into(),
                    provider_response: Some("Hold, draw level".into()),
                },
            )
            .unwrap();
        w.service.escalate_to_pharmacist(&alert_id, Some("dose review")).unwrap();
        let resolved = w
            .service
            .resolve(&alert_id, AlertOutcome::ConfirmedAdr, "Level 2.6 ng/mL", Some("Dose reduced"), &w.nurse.id)
            .unwrap();
        assert_eq!(resolved.status, AlertStatus::ConfirmedAdr);

        assert!(w.service.check_can_administer(&w.patient.id, &w.nurse.id, &w.digoxin.id).unwrap().allowed);
        let active = w
            .service
            .list_active_alerts(&AlertScope::Patient(w.patient.id), &AlertFilter::default())
            .unwrap();
        assert!(active.is_empty());
    }

    #[test]
    fn acknowledge_as_current_requires_signed_in_staff() {
        let w = ward(false);
        let (_, alerts) = w.service.record_observation(&digoxin_observation(w.patient.id)).unwrap();
        let err = w.service.acknowledge_as_current(&alerts[0].id, &ack()).unwrap_err();
        assert!(matches!(err, SurveillanceError::NoCurrentStaff));
        assert_eq!(err.kind(), ErrorKind::ValidationError);
    }

    #[test]
    fn batch_uses_configured_lookback() {
        let w = ward(true);
        let summary = w.service.batch_surveillance(None, None).unwrap();
        assert_eq!(summary.observations_analyzed, 0);
        let runs = w.service.recent_runs(5).unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].run_type, RunType::Batch);
        assert_eq!(runs[0].id, summary.run_id);
    }

    #[test]
    fn repeat_acknowledgment_on_system_clock_is_identical() {
        let w = ward(true);
        let (_, alerts) = w.service.record_observation(&digoxin_observation(w.patient.id)).unwrap();
        let service = SurveillanceService::new(
            w.service.conn.into_inner().unwrap(),
            Arc::new(SystemClock),
            Arc::new(FixedIdentity(None)),
            SurveillanceConfig::default(),
        );
        let staff = Uuid::new_v4();
        let first = service.acknowledge(&alerts[0].id, &staff, &ack()).unwrap();
        let second = service.acknowledge(&alerts[0].id, &staff, &ack()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.expires_at - first.acknowledged_at, Duration::hours(12));
        assert_eq!(service.acknowledgment_history(&alerts[0].id).unwrap(), vec![first]);
    }

    #[test]
    fn huge_lookback_is_a_validation_error() {
        let w = ward(true);
        let err = w.service.batch_surveillance(None, Some(i64::MAX / 4)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationError);
        assert!(w.service.recent_runs(5).unwrap().is_empty());
    }

    #[test]
    fn open_file_backed_service() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("carewatch.db");
        let clock = Arc::new(ManualClock::new(at(date(2024, 1, 1), 8)));
        let service = SurveillanceService::open(
            &path,
            clock,
            Arc::new(FixedIdentity(None)),
            SurveillanceConfig::default(),
        )
        .unwrap();
        assert_eq!(service.seed_knowledge_base(&KnowledgeBase::load_test()).unwrap(), 5);
        assert_eq!(service.config().acknowledgment_validity_hours, 12);
        assert_eq!(
            service.get_alert(&Uuid::new_v4()).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}

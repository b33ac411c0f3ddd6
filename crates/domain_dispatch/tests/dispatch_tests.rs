//! Intake and dispatch tests over the in-memory store and scripted insurers

use std::sync::Arc;
use std::time::Duration;

use core_kernel::{ClaimId, ContentHash};
use domain_cid::{
    CidDocument, CidError, CidStatus, CidSubmission, FailureKind, InsuranceCompany, ProviderResponse,
    SubmissionStore,
};
use domain_dispatch::mock::{ScriptedInsurer, Step};
use domain_dispatch::{RetryPolicy, SubmitCid};
use test_utils::{
    assert_claim_id_format, assert_responses, assert_responses_in_expected_order, assert_status,
    sample_pdf, AccidentFixtures, CidDataBuilder, CidFixtures, PersonInfoBuilder, SubmitCidBuilder,
    TestServiceBuilder,
};

use InsuranceCompany::{Allianz, Axa, Generali, UnipolSai};

mod dispatch_outcomes {
    use super::*;

    #[tokio::test]
    async fn test_both_insurers_accept() {
        let allianz = Arc::new(ScriptedInsurer::accepting(Allianz, "ALZ-1"));
        let generali = Arc::new(ScriptedInsurer::accepting(Generali, "GEN-7"));
        let (service, _) = TestServiceBuilder::new()
            .with_insurer(allianz.clone())
            .with_insurer(generali.clone())
            .build();

        let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf("h1")).build();
        let outcome = service.submit(request).await.unwrap();

        assert!(!outcome.duplicate);
        assert_claim_id_format(&outcome.submission.claim_id.to_string());
        assert_status(&outcome.submission, CidStatus::Approved);
        assert_responses(
            &outcome.submission,
            &[(Allianz, true, Some("ALZ-1")), (Generali, true, Some("GEN-7"))],
        );
        assert_eq!(allianz.calls(), 1);
        assert_eq!(generali.calls(), 1);
    }

    #[tokio::test]
    async fn test_rejection_wins_over_retried_acceptance() {
        let allianz = Arc::new(ScriptedInsurer::new(Allianz, [Step::Reject("policy lapsed".to_string())]));
        let generali = Arc::new(ScriptedInsurer::new(
            Generali,
            [Step::Hang, Step::Hang, Step::Accept("GEN-9".to_string())],
        ));
        let (service, _) = TestServiceBuilder::new()
            .with_insurer(allianz.clone())
            .with_insurer(generali.clone())
            .with_policy(RetryPolicy::new(3, Duration::ZERO, Duration::from_millis(30)))
            .build();

        let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf("h2")).build();
        let submission = service.submit(request).await.unwrap().submission;

        assert_status(&submission, CidStatus::Rejected);
        assert_responses(
            &submission,
            &[(Allianz, false, None), (Generali, true, Some("GEN-9"))],
        );

        let rejection = submission.response_for(Allianz).unwrap();
        assert_eq!(rejection.failure, Some(FailureKind::Rejected));
        assert_eq!(rejection.error_detail.as_deref(), Some("policy lapsed"));
        assert_eq!(rejection.attempts, 1);

        assert_eq!(submission.response_for(Generali).unwrap().attempts, 3);
        assert_eq!(allianz.calls(), 1);
        assert_eq!(generali.calls(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_end_in_error() {
        let axa = Arc::new(ScriptedInsurer::new(Axa, [Step::Unavailable, Step::Unavailable, Step::Unavailable]));
        let unipol = Arc::new(ScriptedInsurer::accepting(UnipolSai, "UNI-3"));
        let (service, _) = TestServiceBuilder::new()
            .with_insurer(axa.clone())
            .with_insurer(unipol)
            .build();

        let data = CidFixtures::between(Axa, UnipolSai);
        let request = SubmitCidBuilder::new(data, sample_pdf("exhausted")).build();
        let submission = service.submit(request).await.unwrap().submission;

        assert_status(&submission, CidStatus::Error);
        let failure = submission.response_for(Axa).unwrap();
        assert!(failure.is_transport_failure());
        assert_eq!(failure.attempts, 3);
        assert_eq!(axa.calls(), 3);
    }

    #[tokio::test]
    async fn test_arrival_order_does_not_change_record() {
        let slow = Arc::new(ScriptedInsurer::accepting(Allianz, "ALZ-2").with_latency(Duration::from_millis(40)));
        let fast = Arc::new(ScriptedInsurer::accepting(Generali, "GEN-2"));
        let (service, _) = TestServiceBuilder::new()
            .with_insurer(slow)
            .with_insurer(fast)
            .build();

        let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf("order")).build();
        let submission = service.submit(request).await.unwrap().submission;

        assert_status(&submission, CidStatus::Approved);
        assert_responses_in_expected_order(&submission);
        assert_eq!(submission.provider_responses[0].provider, Allianz);
    }

    #[tokio::test]
    async fn test_same_insurer_is_called_once() {
        let generali = Arc::new(ScriptedInsurer::accepting(Generali, "GEN-1"));
        let (service, _) = TestServiceBuilder::new().with_insurer(generali.clone()).build();

        let data = CidFixtures::between(Generali, Generali);
        let request = SubmitCidBuilder::new(data, sample_pdf("same-insurer")).build();
        let submission = service.submit(request).await.unwrap().submission;

        assert_eq!(submission.expected_providers, vec![Generali]);
        assert_status(&submission, CidStatus::Approved);
        assert_eq!(generali.calls(), 1);
    }

    #[tokio::test]
    async fn test_simulated_insurers_approve() {
        let (service, _) = TestServiceBuilder::simulated().build();

        let request = SubmitCidBuilder::new(CidFixtures::between(Allianz, UnipolSai), sample_pdf("simulated")).build();
        let submission = service.submit(request).await.unwrap().submission;

        assert_status(&submission, CidStatus::Approved);
        let ids: Vec<_> = submission
            .provider_responses
            .iter()
            .map(|r| r.provider_claim_id.clone().unwrap_or_default())
            .collect();
        assert!(ids[0].starts_with("ALZ-"), "{ids:?}");
        assert!(ids[1].starts_with("UNI-"), "{ids:?}");
    }

    #[tokio::test]
    async fn test_single_worker_serves_every_insurer() {
        let (service, _) = TestServiceBuilder::new()
            .with_insurer(Arc::new(ScriptedInsurer::accepting(Allianz, "ALZ-5")))
            .with_insurer(Arc::new(ScriptedInsurer::accepting(Generali, "GEN-5")))
            .with_max_in_flight(1)
            .build();

        let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf("one-worker")).build();
        let submission = service.submit(request).await.unwrap().submission;

        assert_status(&submission, CidStatus::Approved);
    }
}

mod intake {
    use super::*;

    #[tokio::test]
    async fn test_resubmitting_same_document_is_duplicate() {
        let allianz = Arc::new(ScriptedInsurer::new(
            Allianz,
            [Step::Accept("ALZ-1".to_string()), Step::Accept("ALZ-2".to_string())],
        ));
        let generali = Arc::new(ScriptedInsurer::new(
            Generali,
            [Step::Accept("GEN-1".to_string()), Step::Accept("GEN-2".to_string())],
        ));
        let (service, store) = TestServiceBuilder::new()
            .with_insurer(allianz.clone())
            .with_insurer(generali)
            .build();

        let document = sample_pdf("dedup");
        let first = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), document.clone()).build())
            .await
            .unwrap();
        let second = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), document).build())
            .await
            .unwrap();

        assert!(!first.duplicate);
        assert!(second.duplicate);
        assert_eq!(second.submission.claim_id, first.submission.claim_id);
        assert_eq!(second.submission.status, CidStatus::Approved);
        assert_eq!(store.len().await, 1);
        assert_eq!(allianz.calls(), 1);
    }

    #[tokio::test]
    async fn test_distinct_documents_get_distinct_claims() {
        let (service, store) = TestServiceBuilder::simulated().build();

        let mut ids = Vec::new();
        for tag in ["a", "b", "c"] {
            let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf(tag)).build();
            ids.push(service.submit(request).await.unwrap().submission.claim_id);
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 3);
        assert_eq!(store.len().await, 3);
    }

    #[tokio::test]
    async fn test_hash_mismatch_creates_nothing() {
        let (service, store) = TestServiceBuilder::simulated().build();
        let wrong = ContentHash::of(b"some other document");

        let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf("mismatch"))
            .with_declared_hash(wrong.to_string())
            .build();
        let result = service.submit(request).await;

        match result {
            Err(CidError::HashMismatch { declared, actual }) => {
                assert_eq!(declared, wrong.to_string());
                assert_eq!(actual, ContentHash::of(&sample_pdf("mismatch")));
            }
            other => panic!("expected hash mismatch, got {other:?}"),
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_declared_hash_is_case_insensitive() {
        let (service, _) = TestServiceBuilder::simulated().build();
        let document = sample_pdf("upper");

        let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), document.clone())
            .with_declared_hash(ContentHash::of(&document).to_string().to_uppercase())
            .build();
        let submission = service.submit(request).await.unwrap().submission;

        assert_eq!(submission.content_hash(), &ContentHash::of(&document));
    }

    #[tokio::test]
    async fn test_missing_hash_is_computed() {
        let (service, _) = TestServiceBuilder::simulated().build();
        let document = sample_pdf("no-hash");

        let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), document.clone())
            .without_hash()
            .build();
        let submission = service.submit(request).await.unwrap().submission;

        assert_eq!(submission.content_hash(), &ContentHash::of(&document));
        assert_eq!(submission.document.size_bytes, document.len() as u64);
    }

    #[tokio::test]
    async fn test_invalid_declaration_is_refused() {
        let (service, store) = TestServiceBuilder::simulated().build();
        let data = CidDataBuilder::new().with_circumstances(vec![]).build();

        let result = service
            .submit(SubmitCidBuilder::new(data, sample_pdf("invalid")).build())
            .await;

        match result {
            Err(CidError::Validation(errors)) => {
                assert!(errors.iter().any(|e| e.contains("circumstances")), "{errors:?}");
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_every_blank_field_is_reported() {
        let (service, store) = TestServiceBuilder::simulated().build();
        let mut accident = AccidentFixtures::rear_collision();
        accident.description = " ".to_string();

        let data = CidDataBuilder::new()
            .with_person_a(
                PersonInfoBuilder::insured_with(Allianz)
                    .with_name("  ")
                    .with_license_plate("")
                    .build(),
            )
            .with_person_b(
                PersonInfoBuilder::random(Generali)
                    .with_surname("\t")
                    .with_policy_number("")
                    .build(),
            )
            .with_accident(accident)
            .build();

        let result = service
            .submit(SubmitCidBuilder::new(data, sample_pdf("blank-fields")).build())
            .await;

        match result {
            Err(CidError::Validation(errors)) => {
                for expected in [
                    "person_a.name: must not be blank",
                    "person_a.license_plate: must not be blank",
                    "person_b.surname: must not be blank",
                    "person_b.policy_number: must not be blank",
                    "accident_details.description: must not be blank",
                ] {
                    assert!(errors.iter().any(|e| e == expected), "{expected} missing from {errors:?}");
                }
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_invalid_base64_is_refused() {
        let (service, _) = TestServiceBuilder::simulated().build();

        let result = service
            .submit(SubmitCid {
                cid_data: CidFixtures::allianz_generali(),
                pdf_base64: "not base64 at all!".to_string(),
                pdf_hash: None,
            })
            .await;

        assert!(matches!(result, Err(CidError::Validation(_))));
    }

    #[tokio::test]
    async fn test_empty_document_is_refused() {
        let (service, _) = TestServiceBuilder::simulated().build();

        let result = service
            .submit(SubmitCid {
                cid_data: CidFixtures::allianz_generali(),
                pdf_base64: String::new(),
                pdf_hash: None,
            })
            .await;

        assert!(matches!(result, Err(CidError::Validation(_))));
    }
}

mod upload_and_queries {
    use super::*;

    #[tokio::test]
    async fn test_upload_reports_hash_and_existing_claim() {
        let (service, _) = TestServiceBuilder::simulated().build();
        let document = sample_pdf("upload");

        let uploaded = service
            .upload("cid.pdf", Some("application/pdf"), &document)
            .await
            .unwrap();
        assert_eq!(uploaded.hash, ContentHash::of(&document));
        assert_eq!(uploaded.size, document.len() as u64);
        assert_eq!(uploaded.filename, "cid.pdf");
        assert_eq!(uploaded.existing_claim_id, None);

        let submitted = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), document.clone()).build())
            .await
            .unwrap();

        let again = service
            .upload("cid.pdf", Some("application/pdf"), &document)
            .await
            .unwrap();
        assert_eq!(again.existing_claim_id, Some(submitted.submission.claim_id));
    }

    #[tokio::test]
    async fn test_upload_refuses_non_pdf() {
        let (service, _) = TestServiceBuilder::simulated().build();

        let result = service.upload("photo.png", Some("image/png"), b"\x89PNG").await;
        match result {
            Err(CidError::Validation(errors)) => assert_eq!(errors, vec!["Only PDF files are allowed".to_string()]),
            other => panic!("expected validation error, got {other:?}"),
        }

        let empty = service.upload("cid.pdf", Some("application/pdf"), b"").await;
        assert!(matches!(empty, Err(CidError::Validation(_))));
    }

    #[tokio::test]
    async fn test_find_parses_claim_reference() {
        let (service, _) = TestServiceBuilder::simulated().build();
        let created = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf("find")).build())
            .await
            .unwrap()
            .submission;

        let found = service.find(&created.claim_id.to_string()).await.unwrap();
        assert_eq!(found.claim_id, created.claim_id);

        assert!(matches!(service.find("not-a-claim").await, Err(CidError::NotFound(_))));
        assert!(matches!(
            service.find(&ClaimId::issue().to_string()).await,
            Err(CidError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_returns_newest_first() {
        let (service, _) = TestServiceBuilder::simulated().build();

        let first = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf("first")).build())
            .await
            .unwrap()
            .submission;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), sample_pdf("second")).build())
            .await
            .unwrap()
            .submission;

        let ids: Vec<_> = service.list().await.unwrap().into_iter().map(|s| s.claim_id).collect();
        assert_eq!(ids, vec![second.claim_id, first.claim_id]);
    }

    #[tokio::test]
    async fn test_stored_document_matches_submission() {
        let (service, store) = TestServiceBuilder::simulated().build();
        let document = sample_pdf("stored");

        let submission = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), document.clone()).build())
            .await
            .unwrap()
            .submission;

        assert_eq!(store.document(submission.content_hash()).await.unwrap(), document);
    }

    #[test]
    fn test_providers_lists_registered_insurers() {
        let (service, _) = TestServiceBuilder::new()
            .with_insurer(Arc::new(ScriptedInsurer::accepting(Generali, "GEN-1")))
            .with_insurer(Arc::new(ScriptedInsurer::accepting(Allianz, "ALZ-1")))
            .build();

        assert_eq!(service.providers(), vec![Allianz, Generali]);
    }
}

mod recovery {
    use super::*;

    #[tokio::test]
    async fn test_dropped_submit_still_finishes_dispatch() {
        let allianz = Arc::new(ScriptedInsurer::accepting(Allianz, "ALZ-6").with_latency(Duration::from_millis(50)));
        let generali = Arc::new(ScriptedInsurer::accepting(Generali, "GEN-6").with_latency(Duration::from_millis(50)));
        let (service, store) = TestServiceBuilder::new()
            .with_insurer(allianz.clone())
            .with_insurer(generali.clone())
            .build();
        let document = sample_pdf("dropped");

        let request = SubmitCidBuilder::new(CidFixtures::allianz_generali(), document.clone()).build();
        let dropped = tokio::time::timeout(Duration::from_millis(10), service.submit(request)).await;
        assert!(dropped.is_err(), "submit should still be dispatching");

        tokio::time::sleep(Duration::from_millis(200)).await;
        let stored = store
            .find_by_hash(&ContentHash::of(&document))
            .await
            .unwrap()
            .expect("submission stored");
        assert_status(&stored, CidStatus::Approved);
        assert_responses(
            &stored,
            &[(Allianz, true, Some("ALZ-6")), (Generali, true, Some("GEN-6"))],
        );

        let again = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), document).build())
            .await
            .unwrap();
        assert!(again.duplicate);
        assert_status(&again.submission, CidStatus::Approved);
        assert_eq!(allianz.calls(), 1);
        assert_eq!(generali.calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_resumes_stranded_submission() {
        let allianz = Arc::new(ScriptedInsurer::accepting(Allianz, "ALZ-7"));
        let generali = Arc::new(ScriptedInsurer::accepting(Generali, "GEN-7"));
        let (service, store) = TestServiceBuilder::new()
            .with_insurer(allianz.clone())
            .with_insurer(generali.clone())
            .build();

        let document = sample_pdf("stranded");
        let stranded = CidSubmission::new(CidFixtures::allianz_generali(), CidDocument::for_bytes(&document));
        let claim_id = stranded.claim_id;
        store.create(stranded, document.clone()).await.unwrap();
        store.mark_submitted(claim_id).await.unwrap();

        let outcome = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), document).build())
            .await
            .unwrap();

        assert!(outcome.duplicate);
        assert_eq!(outcome.submission.claim_id, claim_id);
        assert_status(&outcome.submission, CidStatus::Approved);
        assert_responses(
            &outcome.submission,
            &[(Allianz, true, Some("ALZ-7")), (Generali, true, Some("GEN-7"))],
        );
        assert_eq!(allianz.calls(), 1);
        assert_eq!(generali.calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_completes_early_rejection() {
        let allianz = Arc::new(ScriptedInsurer::accepting(Allianz, "ALZ-9"));
        let generali = Arc::new(ScriptedInsurer::accepting(Generali, "GEN-9"));
        let (service, store) = TestServiceBuilder::new()
            .with_insurer(allianz.clone())
            .with_insurer(generali.clone())
            .build();

        let document = sample_pdf("early-rejection");
        let partial = CidSubmission::new(CidFixtures::allianz_generali(), CidDocument::for_bytes(&document));
        let claim_id = partial.claim_id;
        store.create(partial, document.clone()).await.unwrap();
        store.mark_submitted(claim_id).await.unwrap();
        let rejection = ProviderResponse::rejected(Allianz, "policy lapsed", serde_json::Value::Null, 1);
        store.record_response(claim_id, rejection).await.unwrap();

        let outcome = service
            .submit(SubmitCidBuilder::new(CidFixtures::allianz_generali(), document).build())
            .await
            .unwrap();

        assert!(outcome.duplicate);
        assert_status(&outcome.submission, CidStatus::Rejected);
        assert_responses(
            &outcome.submission,
            &[(Allianz, false, None), (Generali, true, Some("GEN-9"))],
        );
        assert_eq!(allianz.calls(), 0);
        assert_eq!(generali.calls(), 1);
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use test_utils::{cid_data_strategy, document_bytes_strategy};

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn every_valid_declaration_reaches_each_insurer_once(
            data in cid_data_strategy(),
            document in document_bytes_strategy(),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            let (first, again, stored) = runtime.block_on(async {
                let (service, store) = TestServiceBuilder::simulated().build();
                let first = service
                    .submit(SubmitCidBuilder::new(data.clone(), document.clone()).build())
                    .await
                    .unwrap();
                let again = service
                    .submit(SubmitCidBuilder::new(data.clone(), document.clone()).build())
                    .await
                    .unwrap();
                (first, again, store.len().await)
            });

            prop_assert!(!first.duplicate);
            prop_assert!(again.duplicate);
            prop_assert_eq!(stored, 1);
            prop_assert_eq!(again.submission.claim_id, first.submission.claim_id);
            prop_assert_eq!(first.submission.status, CidStatus::Approved);
            prop_assert_eq!(&first.submission.expected_providers, &data.insurers());
            let recorded: Vec<_> = first.submission.provider_responses.iter().map(|r| r.provider).collect();
            prop_assert_eq!(recorded, data.insurers());
            prop_assert_eq!(first.submission.content_hash(), &ContentHash::of(&document));
        }
    }
}

// tests/exam_engine_tests.rs

use std::sync::Arc;

use chrono::Utc;
use exam_portal::{
    error::AppError,
    exam::{ExamEngine, ExamSession, ExamStep, ExamStore, MemoryStore},
    models::exam::{ExamAction, SubmitAnswerRequest},
};
use rand::{SeedableRng, rngs::StdRng};

const STUDENT_A: i64 = 1;
const STUDENT_B: i64 = 2;

/// A subject whose questions are all answered correctly with "1".
fn setup(question_count: usize, per_exam: i32) -> (ExamEngine, Arc<MemoryStore>, i64) {
    let store = Arc::new(MemoryStore::new());
    let subject = store
        .add_subject("Chemistry", "العاشر – أكاديمي – الفصل الأول", 40, per_exam)
        .unwrap();
    for i in 0..question_count {
        store
            .add_question(subject.id, &format!("Question {i}"), "1")
            .unwrap();
    }
    (ExamEngine::new(store.clone()), store, subject.id)
}

async fn start(engine: &ExamEngine, subject_id: i64, student_id: i64) -> ExamSession {
    engine
        .start(subject_id, student_id, &mut StdRng::seed_from_u64(2024), Utc::now())
        .await
        .unwrap()
}

fn answer(question_id: i64, option: &str, action: ExamAction) -> SubmitAnswerRequest {
    SubmitAnswerRequest {
        question_id,
        answer: Some(option.to_string()),
        action,
        current_index: None,
    }
}

fn expect_in_progress(step: ExamStep) -> ExamSession {
    match step {
        ExamStep::InProgress(session) => session,
        ExamStep::Finalized(result) => panic!("attempt finalized early: {result:?}"),
    }
}

#[tokio::test]
async fn changing_an_answer_moves_counters_by_one() {
    let (engine, store, subject_id) = setup(3, 3);
    let session = start(&engine, subject_id, STUDENT_A).await;
    let [q1, q2, q3] = [session.question_ids[0], session.question_ids[1], session.question_ids[2]];

    // Q1 right, Q2 wrong
    let session = expect_in_progress(
        engine
            .submit_answer(&session, &answer(q1, "1", ExamAction::Continue))
            .await
            .unwrap(),
    );
    let session = expect_in_progress(
        engine
            .submit_answer(&session, &answer(q2, "3", ExamAction::Continue))
            .await
            .unwrap(),
    );
    let mid = store.find_result(session.result_id).await.unwrap().unwrap();
    assert_eq!((mid.correct_count, mid.wrong_count), (1, 1));

    // Q2 changed to right, then finish with Q3 unanswered
    let back = engine.jump_to_index(&session, 1).await.unwrap();
    let step = engine
        .submit_answer(&back, &answer(q2, "1", ExamAction::Finish))
        .await
        .unwrap();

    let ExamStep::Finalized(result) = step else {
        panic!("finish must finalize");
    };
    assert_eq!(result.correct_count, 2);
    assert_eq!(result.wrong_count, 1);
    assert!((result.score - 66.67).abs() < 0.01);
    assert!(result.is_finalized());
    assert_eq!(store.answer_count(result.id).unwrap(), 2);

    let detail = engine.get_result(result.id, STUDENT_A).await.unwrap();
    assert!(detail.answers.iter().all(|a| a.question_id != q3));
}

#[tokio::test]
async fn repeated_answers_never_drift() {
    let (engine, store, subject_id) = setup(5, 5);
    let session = start(&engine, subject_id, STUDENT_A).await;
    let q = session.question_ids[0];

    for option in ["2", "1", "1", "4", "3", "1", "2"] {
        let mut req = answer(q, option, ExamAction::Continue);
        req.current_index = Some(0);
        engine.submit_answer(&session, &req).await.unwrap();

        let result = store.find_result(session.result_id).await.unwrap().unwrap();
        assert_eq!(result.correct_count + result.wrong_count, 1);
        assert_eq!(result.correct_count, i32::from(option == "1"));
    }
}

#[tokio::test]
async fn counters_match_distinct_answered_questions() {
    let (engine, store, subject_id) = setup(6, 6);
    let mut session = start(&engine, subject_id, STUDENT_A).await;
    let ids = session.question_ids.clone();

    let picks = ["1", "2", "1", "4", "1"];
    for (i, pick) in picks.iter().enumerate() {
        session = expect_in_progress(
            engine
                .submit_answer(&session, &answer(ids[i], pick, ExamAction::Continue))
                .await
                .unwrap(),
        );
        let result = store.find_result(session.result_id).await.unwrap().unwrap();
        assert_eq!(result.correct_count + result.wrong_count, i as i32 + 1);
        assert_eq!(session.index, i + 1);
    }
}

#[tokio::test]
async fn navigating_without_answer_keeps_counters() {
    let (engine, store, subject_id) = setup(4, 4);
    let session = start(&engine, subject_id, STUDENT_A).await;

    let req = SubmitAnswerRequest {
        question_id: session.question_ids[0],
        answer: None,
        action: ExamAction::Continue,
        current_index: Some(2),
    };
    let next = expect_in_progress(engine.submit_answer(&session, &req).await.unwrap());

    assert_eq!(next.index, 3);
    let result = store.find_result(session.result_id).await.unwrap().unwrap();
    assert_eq!((result.correct_count, result.wrong_count), (0, 0));
}

#[tokio::test]
async fn invalid_selections_are_ignored() {
    let (engine, store, subject_id) = setup(3, 3);
    let session = start(&engine, subject_id, STUDENT_A).await;

    // Option out of range
    engine
        .submit_answer(&session, &answer(session.question_ids[0], "9", ExamAction::Continue))
        .await
        .unwrap();
    // Question from outside the attempt
    engine
        .submit_answer(&session, &answer(9_999, "1", ExamAction::Continue))
        .await
        .unwrap();

    let result = store.find_result(session.result_id).await.unwrap().unwrap();
    assert_eq!((result.correct_count, result.wrong_count), (0, 0));
    assert_eq!(store.answer_count(session.result_id).unwrap(), 0);
}

#[tokio::test]
async fn continuing_past_last_question_finalizes() {
    let (engine, _, subject_id) = setup(2, 2);
    let session = start(&engine, subject_id, STUDENT_A).await;
    let last = engine.jump_to_index(&session, 1).await.unwrap();

    let step = engine
        .submit_answer(&last, &answer(last.question_ids[1], "1", ExamAction::Continue))
        .await
        .unwrap();

    let ExamStep::Finalized(result) = step else {
        panic!("last continue must finalize");
    };
    assert_eq!((result.correct_count, result.wrong_count), (1, 1));
    assert_eq!(result.score, 50.0);
}

#[tokio::test]
async fn finalized_attempt_rejects_further_answers() {
    let (engine, _, subject_id) = setup(3, 3);
    let session = start(&engine, subject_id, STUDENT_A).await;
    engine.force_finish(&session).await.unwrap();

    let err = engine
        .submit_answer(&session, &answer(session.question_ids[0], "1", ExamAction::Continue))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NoActiveExam));

    let err = engine.current_question(&session, Utc::now()).await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveExam));
}

#[tokio::test]
async fn force_finish_is_idempotent() {
    let (engine, _, subject_id) = setup(4, 4);
    let session = start(&engine, subject_id, STUDENT_A).await;
    engine
        .submit_answer(&session, &answer(session.question_ids[0], "1", ExamAction::Continue))
        .await
        .unwrap();

    let first = engine.force_finish(&session).await.unwrap();
    let second = engine.force_finish(&session).await.unwrap();

    assert_eq!(first, second);
    assert_eq!((first.correct_count, first.wrong_count), (1, 3));
    assert_eq!(first.score, 25.0);
}

#[tokio::test]
async fn subject_without_questions_creates_no_result() {
    let (engine, store, subject_id) = setup(0, 10);

    let err = engine
        .start(subject_id, STUDENT_A, &mut StdRng::seed_from_u64(1), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NoQuestionsAvailable));
    assert_eq!(store.result_count().unwrap(), 0);
}

#[tokio::test]
async fn small_bank_uses_every_question() {
    let (engine, _, subject_id) = setup(3, 40);
    let session = start(&engine, subject_id, STUDENT_A).await;

    let mut drawn = session.question_ids.clone();
    drawn.sort();
    drawn.dedup();
    assert_eq!(drawn.len(), 3);
}

#[tokio::test]
async fn other_students_result_is_forbidden() {
    let (engine, _, subject_id) = setup(2, 2);
    let session = start(&engine, subject_id, STUDENT_B).await;
    engine.force_finish(&session).await.unwrap();

    let err = engine
        .get_result(session.result_id, STUDENT_A)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let own = engine.get_result(session.result_id, STUDENT_B).await.unwrap();
    assert_eq!(own.result.id, session.result_id);
}

#[tokio::test]
async fn forged_session_for_other_student_is_not_active() {
    let (engine, _, subject_id) = setup(2, 2);
    let session = start(&engine, subject_id, STUDENT_B).await;

    let forged = ExamSession {
        student_id: STUDENT_A,
        ..session
    };
    let err = engine.force_finish(&forged).await.unwrap_err();
    assert!(matches!(err, AppError::NoActiveExam));
}

#[tokio::test]
async fn result_lists_answers_with_questions() {
    let (engine, _, subject_id) = setup(3, 3);
    let session = start(&engine, subject_id, STUDENT_A).await;
    let q = session.question_ids[0];

    engine
        .submit_answer(&session, &answer(q, "2", ExamAction::Finish))
        .await
        .unwrap();

    let detail = engine.get_result(session.result_id, STUDENT_A).await.unwrap();
    assert_eq!(detail.answers.len(), 1);
    let a = &detail.answers[0];
    assert_eq!(a.question_id, q);
    assert_eq!(a.student_answer, "2");
    assert_eq!(a.correct_option, "1");
    assert!(!a.is_correct);
    assert_eq!(detail.result.wrong_count, 3);
}

#[tokio::test]
async fn current_question_reports_saved_answer_and_progress() {
    let (engine, _, subject_id) = setup(3, 3);
    let session = start(&engine, subject_id, STUDENT_A).await;

    let moved = expect_in_progress(
        engine
            .submit_answer(&session, &answer(session.question_ids[0], "4", ExamAction::Continue))
            .await
            .unwrap(),
    );

    let view = engine.current_question(&moved, Utc::now()).await.unwrap();
    assert_eq!(view.index, 1);
    assert_eq!(view.total_questions, 3);
    assert_eq!(view.saved_answer, None);
    assert_eq!(view.answered, vec![0]);
    assert!(view.remaining_seconds > 0);

    let back = engine.jump_to_index(&moved, 0).await.unwrap();
    let view = engine.current_question(&back, Utc::now()).await.unwrap();
    assert_eq!(view.saved_answer, Some(4));
    assert_eq!(view.question.id, session.question_ids[0]);
}

//! Fixed email templates sent by the scenario actors
//!
//! The wording is part of the scenario's observable behavior: tests assert
//! on these exact bodies, so changes here are behavior changes.

/// Subject of the credential email sent to each voter
pub fn credential_email_subject(election_title: &str) -> String {
    format!("Your credential for election {election_title}")
}

/// Body of the credential email, with the voter's own credential and the
/// public election page substituted in
pub fn credential_email_body(election_title: &str, credential: &str, election_url: &str) -> String {
    format!(
        "You are listed as a voter for the election

  {election_title}

You will find below your credential.  To cast a vote, you will also
need a password, sent in a separate email.  Be careful, passwords and
credentials look similar but play different roles.  You will be asked
to enter your credential before entering the voting booth.  Login and
passwords are required once your ballot is ready to be cast.

Credential: {credential}
Page of the election: {election_url}

Note that you are allowed to vote several times.  Only the last vote
counts."
    )
}

/// Subject of the invitation email sent to each trustee
pub const TRUSTEE_EMAIL_SUBJECT: &str = "Link to generate the decryption key";

/// Body of the trustee invitation, with that trustee's own setup link
/// substituted in
pub fn trustee_email_body(link_for_trustee: &str) -> String {
    format!(
        "Dear trustee,

You will find below the link to generate your private decryption key, used to tally the election.

{link_for_trustee}

Here's the instructions:
1. click on the link
2. click on \"generate a new key pair\"
3. your private key will appear in another window or tab. Make sure
you SAVE IT properly otherwise it will not possible to tally and the
election will be canceled.
4. in the first window, click on \"submit\" to send the public part of
your key, used encrypt the votes. For verification purposes, you
should save this part (that starts with \"pok\" \"challenge\"), for
example sending yourself an email.

Regarding your private key, it is crucial you save it (otherwise the
election will be canceled) and store it securely (if your private key
is known together with the private keys of the other trustees, then
vote privacy is no longer guaranteed). We suggest two options:
1. you may store the key on a USB stick and store it in a safe.
2. Or you may simply print it and store it in a safe.
Of course, more cryptographic solutions are welcome as well.

Thank you for your help,

--
The election administrator."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_body_substitutes_all_three_fields() {
        let body = credential_email_body(
            "Spring Budget",
            "cred-xyz",
            "http://localhost:8001/elections/abc",
        );
        assert!(body.contains("  Spring Budget\n"));
        assert!(body.contains("Credential: cred-xyz"));
        assert!(body.contains("Page of the election: http://localhost:8001/elections/abc"));
        assert!(body.ends_with("Only the last vote\ncounts."));
    }

    #[test]
    fn credential_subject_names_the_election() {
        assert_eq!(
            credential_email_subject("Spring Budget"),
            "Your credential for election Spring Budget"
        );
    }

    #[test]
    fn trustee_body_substitutes_the_link() {
        let body = trustee_email_body("http://localhost:8001/draft/trustee/42");
        assert!(body.starts_with("Dear trustee,"));
        assert!(body.contains("\nhttp://localhost:8001/draft/trustee/42\n"));
        assert!(body.contains("SAVE IT"));
        assert!(body.ends_with("The election administrator."));
    }
}
